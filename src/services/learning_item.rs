// src/services/learning_item.rs

use std::collections::HashSet;

use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    config::Config,
    error::AppError,
    models::{
        document::{DocumentDto, DocumentUploadForm, UploadedFile},
        enums::LearningItemType,
        learning_item::{
            LearningItem, LearningItemCreateRequest, LearningItemDto, LearningItemUpdateRequest,
        },
    },
    services::{begin_write, document, quiz_attempt, storage::FileStorage, week},
    utils::{html::clean_optional_html, jwt::CurrentUser},
};

const SELECT_ITEM: &str = r#"
    SELECT id, week_id, title, type, content, duration_minutes, order_index, quiz_bank_id
    FROM learning_items
"#;

pub(crate) async fn find_item(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<LearningItem>, AppError> {
    let item = sqlx::query_as::<_, LearningItem>(&format!("{SELECT_ITEM} WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(item)
}

async fn fetch_item(conn: &mut SqliteConnection, id: i64) -> Result<LearningItem, AppError> {
    find_item(conn, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Learning item not found with id: {id}")))
}

/// Course an item belongs to, through its week.
pub(crate) async fn course_of_item(
    conn: &mut SqliteConnection,
    item_id: i64,
) -> Result<Option<i64>, AppError> {
    let course_id = sqlx::query_scalar(
        r#"
        SELECT w.course_id
        FROM learning_items li
        JOIN weeks w ON w.id = li.week_id
        WHERE li.id = ?
        "#,
    )
    .bind(item_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(course_id)
}

async fn to_dto(conn: &mut SqliteConnection, item: LearningItem) -> Result<LearningItemDto, AppError> {
    let documents = document::documents_of_item(conn, item.id)
        .await?
        .into_iter()
        .map(DocumentDto::from)
        .collect();
    Ok(LearningItemDto::new(item, documents))
}

/// Items of a week in display order, each with its documents.
pub(crate) async fn items_of_week(
    conn: &mut SqliteConnection,
    week_id: i64,
    item_type: Option<LearningItemType>,
) -> Result<Vec<LearningItemDto>, AppError> {
    let items = match item_type {
        Some(item_type) => {
            sqlx::query_as::<_, LearningItem>(&format!(
                "{SELECT_ITEM} WHERE week_id = ? AND type = ? ORDER BY order_index, id"
            ))
            .bind(week_id)
            .bind(item_type.as_str())
            .fetch_all(&mut *conn)
            .await?
        }
        None => {
            sqlx::query_as::<_, LearningItem>(&format!(
                "{SELECT_ITEM} WHERE week_id = ? ORDER BY order_index, id"
            ))
            .bind(week_id)
            .fetch_all(&mut *conn)
            .await?
        }
    };

    let mut dtos = Vec::with_capacity(items.len());
    for item in items {
        dtos.push(to_dto(conn, item).await?);
    }
    Ok(dtos)
}

/// A linked quiz bank must exist and only QUIZ items may carry one.
async fn check_quiz_bank(
    conn: &mut SqliteConnection,
    item_type: LearningItemType,
    quiz_bank_id: Option<i64>,
) -> Result<(), AppError> {
    let Some(bank_id) = quiz_bank_id else {
        return Ok(());
    };
    if item_type != LearningItemType::Quiz {
        return Err(AppError::BadRequest(
            "Only QUIZ learning items can be linked to a quiz bank".to_string(),
        ));
    }
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM quiz_banks WHERE id = ?")
        .bind(bank_id)
        .fetch_optional(&mut *conn)
        .await?;
    if found.is_none() {
        return Err(AppError::NotFound(format!("Quiz bank not found with id: {bank_id}")));
    }
    Ok(())
}

/// A missing or zero order index appends the item after the existing ones.
pub async fn create_item(
    pool: &SqlitePool,
    req: LearningItemCreateRequest,
) -> Result<LearningItemDto, AppError> {
    let mut tx = begin_write(pool).await?;

    if week::find_week(&mut tx, req.week_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Week not found with id: {}",
            req.week_id
        )));
    }
    check_quiz_bank(&mut tx, req.item_type, req.quiz_bank_id).await?;

    let order_index = match req.order_index {
        Some(index) if index > 0 => index,
        _ => {
            let count: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM learning_items WHERE week_id = ?")
                    .bind(req.week_id)
                    .fetch_one(&mut *tx)
                    .await?;
            count as i32
        }
    };

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO learning_items
            (week_id, title, type, content, duration_minutes, order_index, quiz_bank_id)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(req.week_id)
    .bind(&req.title)
    .bind(req.item_type.as_str())
    .bind(clean_optional_html(req.content.as_deref()))
    .bind(req.duration_minutes.unwrap_or(0))
    .bind(order_index)
    .bind(req.quiz_bank_id)
    .fetch_one(&mut *tx)
    .await?;

    let item = fetch_item(&mut tx, id).await?;
    let dto = to_dto(&mut tx, item).await?;
    tx.commit().await?;

    tracing::info!("Learning item {} created in week {}", id, req.week_id);
    Ok(dto)
}

pub async fn get_item(pool: &SqlitePool, id: i64) -> Result<LearningItemDto, AppError> {
    let mut conn = pool.acquire().await?;
    let item = fetch_item(&mut conn, id).await?;
    to_dto(&mut conn, item).await
}

pub async fn items_by_week(
    pool: &SqlitePool,
    week_id: i64,
    item_type: Option<LearningItemType>,
) -> Result<Vec<LearningItemDto>, AppError> {
    let mut conn = pool.acquire().await?;
    if week::find_week(&mut conn, week_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Week not found with id: {week_id}")));
    }
    items_of_week(&mut conn, week_id, item_type).await
}

pub async fn update_item(
    pool: &SqlitePool,
    id: i64,
    req: LearningItemUpdateRequest,
) -> Result<LearningItemDto, AppError> {
    let mut tx = begin_write(pool).await?;
    let current = fetch_item(&mut tx, id).await?;

    let quiz_bank_id = if req.item_type == LearningItemType::Quiz {
        req.quiz_bank_id.or(current.quiz_bank_id)
    } else {
        None
    };
    check_quiz_bank(&mut tx, req.item_type, req.quiz_bank_id).await?;

    sqlx::query(
        r#"
        UPDATE learning_items
        SET title = ?, type = ?, content = ?, duration_minutes = ?, order_index = ?, quiz_bank_id = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.title)
    .bind(req.item_type.as_str())
    .bind(clean_optional_html(req.content.as_deref()))
    .bind(req.duration_minutes.unwrap_or(current.duration_minutes))
    .bind(req.order_index.unwrap_or(current.order_index))
    .bind(quiz_bank_id)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    let item = fetch_item(&mut tx, id).await?;
    let dto = to_dto(&mut tx, item).await?;
    tx.commit().await?;
    Ok(dto)
}

/// Order indices become the positions in `item_ids`.
pub async fn reorder_items(
    pool: &SqlitePool,
    week_id: i64,
    item_ids: &[i64],
) -> Result<Vec<LearningItemDto>, AppError> {
    let mut tx = begin_write(pool).await?;

    if week::find_week(&mut tx, week_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Week not found with id: {week_id}")));
    }

    let in_week: HashSet<i64> =
        sqlx::query_scalar::<_, i64>("SELECT id FROM learning_items WHERE week_id = ?")
            .bind(week_id)
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .collect();

    let mut seen = HashSet::with_capacity(item_ids.len());
    for item_id in item_ids {
        if !in_week.contains(item_id) {
            return Err(AppError::BadRequest(format!(
                "Learning item with id {item_id} does not exist in week {week_id}"
            )));
        }
        if !seen.insert(*item_id) {
            return Err(AppError::BadRequest(format!(
                "Learning item with id {item_id} is listed twice"
            )));
        }
    }

    for (position, item_id) in item_ids.iter().enumerate() {
        sqlx::query("UPDATE learning_items SET order_index = ? WHERE id = ?")
            .bind(position as i32)
            .bind(item_id)
            .execute(&mut *tx)
            .await?;
    }

    let items = items_of_week(&mut tx, week_id, None).await?;
    tx.commit().await?;
    Ok(items)
}

/// Deletes items together with their attempts and responses.
/// Documents are detached and kept.
pub(crate) async fn delete_items(
    conn: &mut SqliteConnection,
    item_ids: &[i64],
) -> Result<(), AppError> {
    document::detach_from_items(conn, item_ids).await?;
    quiz_attempt::delete_for_items(conn, item_ids).await?;
    for item_id in item_ids {
        sqlx::query("DELETE FROM learning_items WHERE id = ?")
            .bind(item_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

pub async fn delete_item(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let mut tx = begin_write(pool).await?;
    fetch_item(&mut tx, id).await?;
    delete_items(&mut tx, &[id]).await?;
    tx.commit().await?;

    tracing::info!("Learning item {} deleted", id);
    Ok(())
}

/// Replaces the item's document with a new upload.
pub async fn upload_item_document(
    pool: &SqlitePool,
    storage: &dyn FileStorage,
    config: &Config,
    caller: &CurrentUser,
    item_id: i64,
    mut form: DocumentUploadForm,
    file: UploadedFile,
) -> Result<DocumentDto, AppError> {
    let existing = {
        let mut conn = pool.acquire().await?;
        fetch_item(&mut conn, item_id).await?;
        document::documents_of_item(&mut conn, item_id).await?
    };

    if let Some(previous) = existing.first() {
        document::delete_document(pool, storage, caller, previous.id).await?;
    }

    form.learning_item_id = Some(item_id);
    document::upload_document(pool, storage, config, caller, form, file).await
}

pub async fn remove_item_document(
    pool: &SqlitePool,
    storage: &dyn FileStorage,
    caller: &CurrentUser,
    item_id: i64,
    document_id: i64,
) -> Result<(), AppError> {
    let attached = {
        let mut conn = pool.acquire().await?;
        document::find_document(&mut conn, document_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Document not found with id: {document_id}"))
            })?
            .learning_item_id
    };

    if attached != Some(item_id) {
        return Err(AppError::BadRequest(format!(
            "Document {document_id} is not attached to learning item {item_id}"
        )));
    }

    document::delete_document(pool, storage, caller, document_id).await
}

/// URL of the first document attached to the item.
pub async fn download_url(pool: &SqlitePool, item_id: i64) -> Result<String, AppError> {
    let mut conn = pool.acquire().await?;
    let first = document::documents_of_item(&mut conn, item_id)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| {
            AppError::NotFound("No document found for this learning item".to_string())
        })?;

    if first.file_url.is_empty() {
        return Err(AppError::BadRequest("Invalid file URL".to_string()));
    }
    Ok(first.file_url)
}
