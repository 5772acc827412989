// src/services/course.rs

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    config::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE},
    error::AppError,
    models::{
        course::{
            CourseCreateRequest, CourseDetailDto, CourseDto, CourseListParams, CourseRow,
            CourseTotals,
        },
        response::PagedResponse,
    },
    services::{begin_write, week},
    utils::{html::clean_optional_html, jwt::CurrentUser},
};

const SELECT_COURSE: &str = r#"
    SELECT
        c.id,
        c.name,
        c.category,
        c.price,
        c.is_free,
        c.is_draft,
        c.estimated_weeks,
        c.summary,
        c.description,
        c.thumbnail_url,
        c.teacher_id,
        u.name AS teacher_name,
        c.created_at
    FROM courses c
    LEFT JOIN users u ON u.id = c.teacher_id
"#;

pub(crate) async fn exists(conn: &mut SqliteConnection, id: i64) -> Result<bool, AppError> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM courses WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(found.is_some())
}

pub(crate) async fn find_course(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<CourseRow>, AppError> {
    let row = sqlx::query_as::<_, CourseRow>(&format!("{SELECT_COURSE} WHERE c.id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

async fn fetch_course(conn: &mut SqliteConnection, id: i64) -> Result<CourseRow, AppError> {
    find_course(conn, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Course not found with id: {id}")))
}

async fn totals(conn: &mut SqliteConnection, course_id: i64) -> Result<CourseTotals, AppError> {
    let totals = sqlx::query_as::<_, CourseTotals>(
        r#"
        SELECT
            COUNT(li.id) AS number_of_lessons,
            COALESCE(SUM(li.duration_minutes), 0) AS total_duration_minutes
        FROM learning_items li
        JOIN weeks w ON w.id = li.week_id
        WHERE w.course_id = ?
        "#,
    )
    .bind(course_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(totals)
}

pub(crate) async fn to_dto(conn: &mut SqliteConnection, row: CourseRow) -> Result<CourseDto, AppError> {
    let totals = totals(conn, row.id).await?;
    Ok(CourseDto::from_row(row, totals))
}

pub(crate) async fn to_dtos(
    conn: &mut SqliteConnection,
    rows: Vec<CourseRow>,
) -> Result<Vec<CourseDto>, AppError> {
    let mut dtos = Vec::with_capacity(rows.len());
    for row in rows {
        dtos.push(to_dto(conn, row).await?);
    }
    Ok(dtos)
}

/// Escapes LIKE wildcards so user input matches literally.
/// Pair with `ESCAPE '\'` in the query.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Published courses filtered by course and teacher name, sorted by name.
pub async fn published_courses(
    pool: &SqlitePool,
    params: &CourseListParams,
) -> Result<PagedResponse<CourseDto>, AppError> {
    let page = params.page.unwrap_or(0).max(0);
    let size = params
        .size
        .filter(|s| *s > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .min(MAX_PAGE_SIZE);

    let name = params
        .name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .map(like_pattern);
    let teacher = params
        .teacher
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(like_pattern);

    const FILTER: &str = r#"
        WHERE c.is_draft = 0
          AND (?1 IS NULL OR LOWER(c.name) LIKE ?1 ESCAPE '\')
          AND (?2 IS NULL OR LOWER(COALESCE(u.name, '')) LIKE ?2 ESCAPE '\')
    "#;

    let mut conn = pool.acquire().await?;

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM courses c LEFT JOIN users u ON u.id = c.teacher_id {FILTER}"
    ))
    .bind(&name)
    .bind(&teacher)
    .fetch_one(&mut *conn)
    .await?;

    let rows = sqlx::query_as::<_, CourseRow>(&format!(
        "{SELECT_COURSE} {FILTER} ORDER BY c.name, c.id LIMIT ?3 OFFSET ?4"
    ))
    .bind(&name)
    .bind(&teacher)
    .bind(size)
    .bind(page * size)
    .fetch_all(&mut *conn)
    .await?;

    let content = to_dtos(&mut conn, rows).await?;
    Ok(PagedResponse::new(content, page, size, total))
}

/// Every course the caller teaches, drafts included.
pub async fn teaching_courses(
    pool: &SqlitePool,
    caller: &CurrentUser,
) -> Result<Vec<CourseDto>, AppError> {
    let mut conn = pool.acquire().await?;
    let rows = sqlx::query_as::<_, CourseRow>(&format!(
        "{SELECT_COURSE} WHERE c.teacher_id = ? ORDER BY c.created_at DESC, c.id DESC"
    ))
    .bind(caller.id)
    .fetch_all(&mut *conn)
    .await?;
    to_dtos(&mut conn, rows).await
}

/// A published course with its weeks and items. Drafts read as missing.
pub async fn course_detail(pool: &SqlitePool, id: i64) -> Result<CourseDetailDto, AppError> {
    let mut conn = pool.acquire().await?;
    let row = fetch_course(&mut conn, id).await?;
    if row.is_draft {
        return Err(AppError::NotFound(
            "Course not found or is not published yet".to_string(),
        ));
    }

    let weeks = week::weeks_of_course(&mut conn, id).await?;
    let course = to_dto(&mut conn, row).await?;
    Ok(CourseDetailDto { course, weeks })
}

pub async fn create_course(
    pool: &SqlitePool,
    caller: &CurrentUser,
    req: CourseCreateRequest,
) -> Result<CourseDto, AppError> {
    let mut tx = begin_write(pool).await?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO courses (
            name, category, price, is_free, is_draft, estimated_weeks, summary,
            description, thumbnail_url, teacher_id, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&req.name)
    .bind(&req.category)
    .bind(req.price)
    .bind(req.is_free)
    .bind(req.is_draft)
    .bind(req.estimated_weeks)
    .bind(&req.summary)
    .bind(clean_optional_html(req.description.as_deref()))
    .bind(&req.thumbnail_url)
    .bind(caller.id)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await?;

    let row = fetch_course(&mut tx, id).await?;
    let dto = to_dto(&mut tx, row).await?;
    tx.commit().await?;

    tracing::info!("{} created course {} ({})", caller.username, id, req.name);
    Ok(dto)
}

fn ensure_owner(row: &CourseRow, caller: &CurrentUser) -> Result<(), AppError> {
    if row.teacher_id == Some(caller.id) || caller.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only the course owner can modify this course".to_string(),
        ))
    }
}

pub async fn update_course(
    pool: &SqlitePool,
    caller: &CurrentUser,
    id: i64,
    req: CourseCreateRequest,
) -> Result<CourseDto, AppError> {
    let mut tx = begin_write(pool).await?;
    let current = fetch_course(&mut tx, id).await?;
    ensure_owner(&current, caller)?;

    sqlx::query(
        r#"
        UPDATE courses
        SET name = ?, category = ?, price = ?, is_free = ?, is_draft = ?, estimated_weeks = ?,
            summary = ?, description = ?, thumbnail_url = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.name)
    .bind(&req.category)
    .bind(req.price)
    .bind(req.is_free)
    .bind(req.is_draft)
    .bind(req.estimated_weeks)
    .bind(&req.summary)
    .bind(clean_optional_html(req.description.as_deref()))
    .bind(&req.thumbnail_url)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    let row = fetch_course(&mut tx, id).await?;
    let dto = to_dto(&mut tx, row).await?;
    tx.commit().await?;
    Ok(dto)
}

/// Deletes a course and everything below it in one transaction:
/// responses, attempts, item links of documents, items, weeks, enrollments.
pub async fn delete_course(
    pool: &SqlitePool,
    caller: &CurrentUser,
    id: i64,
) -> Result<(), AppError> {
    let mut tx = begin_write(pool).await?;
    let current = fetch_course(&mut tx, id).await?;
    ensure_owner(&current, caller)?;

    let week_ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM weeks WHERE course_id = ?")
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;
    week::delete_weeks(&mut tx, &week_ids).await?;

    sqlx::query("DELETE FROM enrollments WHERE course_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM courses WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(
        "{} deleted course {} with {} weeks",
        caller.username,
        id,
        week_ids.len()
    );
    Ok(())
}
