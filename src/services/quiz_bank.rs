// src/services/quiz_bank.rs

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    error::AppError,
    models::{
        enums::LearningItemType,
        learning_item::LearningItemDto,
        quiz_bank::{QuizBank, QuizBankCreateRequest, QuizBankDto, QuizBankUpdateRequest},
    },
    services::{begin_write, learning_item, user},
    utils::jwt::CurrentUser,
};

const SELECT_BANK: &str = r#"
    SELECT
        b.id,
        b.title,
        b.description,
        b.created_by,
        u.name AS created_by_name,
        b.creation_date,
        b.last_modified_date,
        b.active,
        (SELECT COUNT(*) FROM questions q WHERE q.quiz_bank_id = b.id) AS question_count
    FROM quiz_banks b
    LEFT JOIN users u ON u.id = b.created_by
"#;

pub(crate) async fn find_bank(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<QuizBank>, AppError> {
    let bank = sqlx::query_as::<_, QuizBank>(&format!("{SELECT_BANK} WHERE b.id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(bank)
}

async fn fetch_bank(conn: &mut SqliteConnection, id: i64) -> Result<QuizBank, AppError> {
    find_bank(conn, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Quiz bank not found with id: {id}")))
}

pub async fn create_bank(
    pool: &SqlitePool,
    caller: &CurrentUser,
    req: QuizBankCreateRequest,
) -> Result<QuizBankDto, AppError> {
    let mut tx = begin_write(pool).await?;
    let now = Utc::now();

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO quiz_banks (title, description, created_by, creation_date, last_modified_date, active)
        VALUES (?, ?, ?, ?, ?, 1)
        RETURNING id
        "#,
    )
    .bind(&req.title)
    .bind(&req.description)
    .bind(caller.id)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    let bank = fetch_bank(&mut tx, id).await?;
    tx.commit().await?;

    tracing::info!("{} created quiz bank {}", caller.username, id);
    Ok(bank.into())
}

pub async fn get_bank(pool: &SqlitePool, id: i64) -> Result<QuizBankDto, AppError> {
    let mut conn = pool.acquire().await?;
    Ok(fetch_bank(&mut conn, id).await?.into())
}

pub async fn active_banks(pool: &SqlitePool) -> Result<Vec<QuizBankDto>, AppError> {
    let banks = sqlx::query_as::<_, QuizBank>(&format!(
        "{SELECT_BANK} WHERE b.active = 1 ORDER BY b.creation_date DESC, b.id DESC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(banks.into_iter().map(QuizBankDto::from).collect())
}

pub async fn banks_by_teacher(pool: &SqlitePool, teacher_id: i64) -> Result<Vec<QuizBankDto>, AppError> {
    let mut conn = pool.acquire().await?;
    if !user::exists(&mut conn, teacher_id).await? {
        return Err(AppError::NotFound("Teacher not found".to_string()));
    }

    let banks = sqlx::query_as::<_, QuizBank>(&format!(
        "{SELECT_BANK} WHERE b.created_by = ? AND b.active = 1 ORDER BY b.creation_date DESC, b.id DESC"
    ))
    .bind(teacher_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(banks.into_iter().map(QuizBankDto::from).collect())
}

/// Patch semantics. `lastModifiedDate` moves only when a field actually changes.
pub async fn update_bank(
    pool: &SqlitePool,
    id: i64,
    req: QuizBankUpdateRequest,
) -> Result<QuizBankDto, AppError> {
    let mut tx = begin_write(pool).await?;
    let current = fetch_bank(&mut tx, id).await?;

    let mut title = current.title.clone();
    let mut description = current.description.clone();
    let mut active = current.active;
    let mut changed = false;

    if let Some(new_title) = req.title.filter(|t| !t.trim().is_empty()) {
        if new_title != title {
            title = new_title;
            changed = true;
        }
    }
    if let Some(new_description) = req.description {
        if description.as_deref() != Some(new_description.as_str()) {
            description = Some(new_description);
            changed = true;
        }
    }
    if let Some(new_active) = req.active {
        if new_active != active {
            active = new_active;
            changed = true;
        }
    }

    if changed {
        sqlx::query(
            r#"
            UPDATE quiz_banks
            SET title = ?, description = ?, active = ?, last_modified_date = ?
            WHERE id = ?
            "#,
        )
        .bind(&title)
        .bind(&description)
        .bind(active)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;
    }

    let bank = fetch_bank(&mut tx, id).await?;
    tx.commit().await?;
    Ok(bank.into())
}

/// Soft delete: the bank and its questions stay for existing attempts.
pub async fn delete_bank(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let mut conn = pool.acquire().await?;
    fetch_bank(&mut conn, id).await?;

    sqlx::query("UPDATE quiz_banks SET active = 0, last_modified_date = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await?;

    tracing::info!("Quiz bank {} deactivated", id);
    Ok(())
}

/// Links an active bank to a QUIZ learning item.
pub async fn associate_learning_item(
    pool: &SqlitePool,
    bank_id: i64,
    learning_item_id: i64,
) -> Result<LearningItemDto, AppError> {
    let mut tx = begin_write(pool).await?;

    let bank = fetch_bank(&mut tx, bank_id).await?;
    if !bank.active {
        return Err(AppError::BadRequest(
            "Quiz bank is not active and cannot be associated with learning items".to_string(),
        ));
    }

    let item = learning_item::find_item(&mut tx, learning_item_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Learning item not found with id: {learning_item_id}"
            ))
        })?;
    if item.item_type != LearningItemType::Quiz {
        return Err(AppError::BadRequest(
            "Learning item is not a quiz. Only learning items of type QUIZ can be associated with quiz banks."
                .to_string(),
        ));
    }

    sqlx::query("UPDATE learning_items SET quiz_bank_id = ? WHERE id = ?")
        .bind(bank_id)
        .bind(learning_item_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!("Quiz bank {} linked to learning item {}", bank_id, learning_item_id);
    learning_item::get_item(pool, learning_item_id).await
}
