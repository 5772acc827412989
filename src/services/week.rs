// src/services/week.rs

use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    error::{AppError, is_unique_violation},
    models::week::{Week, WeekCreateRequest, WeekDto, WeekUpdateRequest},
    services::{begin_write, course, learning_item},
};

const SELECT_WEEK: &str = "SELECT id, course_id, title, description, week_number FROM weeks";

pub(crate) async fn find_week(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<Week>, AppError> {
    let week = sqlx::query_as::<_, Week>(&format!("{SELECT_WEEK} WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(week)
}

async fn fetch_week(conn: &mut SqliteConnection, id: i64) -> Result<Week, AppError> {
    find_week(conn, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Week not found with id: {id}")))
}

async fn to_dto(conn: &mut SqliteConnection, week: Week) -> Result<WeekDto, AppError> {
    let items = learning_item::items_of_week(conn, week.id, None).await?;
    Ok(WeekDto::new(week, items))
}

/// Weeks of a course ordered by week number, items embedded.
pub(crate) async fn weeks_of_course(
    conn: &mut SqliteConnection,
    course_id: i64,
) -> Result<Vec<WeekDto>, AppError> {
    let weeks = sqlx::query_as::<_, Week>(&format!(
        "{SELECT_WEEK} WHERE course_id = ? ORDER BY week_number"
    ))
    .bind(course_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut dtos = Vec::with_capacity(weeks.len());
    for week in weeks {
        dtos.push(to_dto(conn, week).await?);
    }
    Ok(dtos)
}

fn duplicate_week_number(week_number: i32) -> AppError {
    AppError::BadRequest(format!(
        "A week with number {week_number} already exists in this course"
    ))
}

async fn week_number_taken(
    conn: &mut SqliteConnection,
    course_id: i64,
    week_number: i32,
    except_id: Option<i64>,
) -> Result<bool, AppError> {
    let found: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM weeks WHERE course_id = ? AND week_number = ? AND id != ?",
    )
    .bind(course_id)
    .bind(week_number)
    .bind(except_id.unwrap_or(0))
    .fetch_optional(&mut *conn)
    .await?;
    Ok(found.is_some())
}

pub async fn weeks_by_course(pool: &SqlitePool, course_id: i64) -> Result<Vec<WeekDto>, AppError> {
    let mut conn = pool.acquire().await?;
    if !course::exists(&mut conn, course_id).await? {
        return Err(AppError::NotFound(format!(
            "Course not found with id: {course_id}"
        )));
    }
    weeks_of_course(&mut conn, course_id).await
}

pub async fn get_week(pool: &SqlitePool, id: i64) -> Result<WeekDto, AppError> {
    let mut conn = pool.acquire().await?;
    let week = fetch_week(&mut conn, id).await?;
    to_dto(&mut conn, week).await
}

pub async fn create_week(pool: &SqlitePool, req: WeekCreateRequest) -> Result<WeekDto, AppError> {
    let mut tx = begin_write(pool).await?;

    if !course::exists(&mut tx, req.course_id).await? {
        return Err(AppError::NotFound(format!(
            "Course not found with id: {}",
            req.course_id
        )));
    }
    if week_number_taken(&mut tx, req.course_id, req.week_number, None).await? {
        return Err(duplicate_week_number(req.week_number));
    }

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO weeks (course_id, title, description, week_number)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(req.course_id)
    .bind(&req.title)
    .bind(&req.description)
    .bind(req.week_number)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            duplicate_week_number(req.week_number)
        } else {
            AppError::from(e)
        }
    })?;

    let week = fetch_week(&mut tx, id).await?;
    let dto = to_dto(&mut tx, week).await?;
    tx.commit().await?;

    tracing::info!("Week {} added to course {}", req.week_number, req.course_id);
    Ok(dto)
}

pub async fn update_week(
    pool: &SqlitePool,
    id: i64,
    req: WeekUpdateRequest,
) -> Result<WeekDto, AppError> {
    let mut tx = begin_write(pool).await?;
    let current = fetch_week(&mut tx, id).await?;

    if req.week_number != current.week_number
        && week_number_taken(&mut tx, current.course_id, req.week_number, Some(id)).await?
    {
        return Err(duplicate_week_number(req.week_number));
    }

    sqlx::query("UPDATE weeks SET title = ?, description = ?, week_number = ? WHERE id = ?")
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.week_number)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                duplicate_week_number(req.week_number)
            } else {
                AppError::from(e)
            }
        })?;

    let week = fetch_week(&mut tx, id).await?;
    let dto = to_dto(&mut tx, week).await?;
    tx.commit().await?;
    Ok(dto)
}

/// Deletes the weeks and everything under them (see `learning_item::delete_items`).
pub(crate) async fn delete_weeks(
    conn: &mut SqliteConnection,
    week_ids: &[i64],
) -> Result<(), AppError> {
    for week_id in week_ids {
        let item_ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM learning_items WHERE week_id = ?")
            .bind(week_id)
            .fetch_all(&mut *conn)
            .await?;
        learning_item::delete_items(conn, &item_ids).await?;

        sqlx::query("DELETE FROM weeks WHERE id = ?")
            .bind(week_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

pub async fn delete_week(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let mut tx = begin_write(pool).await?;
    fetch_week(&mut tx, id).await?;
    delete_weeks(&mut tx, &[id]).await?;
    tx.commit().await?;

    tracing::info!("Week {} deleted", id);
    Ok(())
}
