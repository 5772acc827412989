// src/services/document.rs

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    config::Config,
    error::AppError,
    models::document::{
        Document, DocumentDto, DocumentUpdateRequest, DocumentUploadForm, UploadedFile,
    },
    services::{begin_write, course::like_pattern, learning_item, storage::FileStorage},
    utils::{
        files::{content_type_for, is_video},
        jwt::CurrentUser,
    },
};

const SELECT_DOCUMENT: &str = r#"
    SELECT
        d.id,
        d.title,
        d.file_name,
        d.content_type,
        d.file_size,
        d.file_url,
        d.description,
        d.uploaded_at,
        d.uploaded_by,
        u.username AS uploaded_by_username,
        d.learning_item_id,
        d.is_video
    FROM documents d
    LEFT JOIN users u ON u.id = d.uploaded_by
"#;

fn to_dtos(documents: Vec<Document>) -> Vec<DocumentDto> {
    documents.into_iter().map(DocumentDto::from).collect()
}

pub(crate) async fn find_document(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<Document>, AppError> {
    let document = sqlx::query_as::<_, Document>(&format!("{SELECT_DOCUMENT} WHERE d.id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(document)
}

async fn fetch_document(conn: &mut SqliteConnection, id: i64) -> Result<Document, AppError> {
    find_document(conn, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document not found with id: {id}")))
}

pub(crate) async fn documents_of_item(
    conn: &mut SqliteConnection,
    learning_item_id: i64,
) -> Result<Vec<Document>, AppError> {
    let documents = sqlx::query_as::<_, Document>(&format!(
        "{SELECT_DOCUMENT} WHERE d.learning_item_id = ? ORDER BY d.uploaded_at, d.id"
    ))
    .bind(learning_item_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(documents)
}

/// Detaches every document from the given items; the files themselves stay.
pub(crate) async fn detach_from_items(
    conn: &mut SqliteConnection,
    learning_item_ids: &[i64],
) -> Result<(), AppError> {
    for item_id in learning_item_ids {
        sqlx::query("UPDATE documents SET learning_item_id = NULL WHERE learning_item_id = ?")
            .bind(item_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

fn ensure_uploader(document: &Document, caller: &CurrentUser, action: &str) -> Result<(), AppError> {
    if document.uploaded_by == caller.id {
        Ok(())
    } else {
        tracing::warn!(
            "User {} tried to {} document {} owned by {}",
            caller.username,
            action,
            document.id,
            document.uploaded_by
        );
        Err(AppError::Forbidden(format!(
            "You don't have permission to {action} this document"
        )))
    }
}

/// Stores the file (under `courses/{courseId}` when attached to an item,
/// `documents` otherwise) and records it.
pub async fn upload_document(
    pool: &SqlitePool,
    storage: &dyn FileStorage,
    config: &Config,
    caller: &CurrentUser,
    form: DocumentUploadForm,
    file: UploadedFile,
) -> Result<DocumentDto, AppError> {
    if file.bytes.is_empty() {
        return Err(AppError::BadRequest("Please select a file to upload".to_string()));
    }
    let file_size = file.bytes.len() as u64;
    if file_size > config.max_upload_bytes() {
        return Err(AppError::BadRequest(format!(
            "File exceeds the maximum upload size of {} MB",
            config.max_upload_mb
        )));
    }

    let directory = match form.learning_item_id {
        Some(item_id) => {
            let mut conn = pool.acquire().await?;
            let course_id = learning_item::course_of_item(&mut conn, item_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Learning item not found with id: {item_id}"))
                })?;
            format!("courses/{course_id}")
        }
        None => "documents".to_string(),
    };

    let content_type = file
        .content_type
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream")
        .unwrap_or_else(|| content_type_for(&file.file_name).to_string());
    let is_video = form.is_video.unwrap_or_else(|| is_video(&content_type));

    let file_url = storage
        .store(&directory, &file.file_name, &content_type, file.bytes)
        .await?;

    let inserted: Result<i64, sqlx::Error> = sqlx::query_scalar(
        r#"
        INSERT INTO documents (
            title, file_name, content_type, file_size, file_url, description,
            uploaded_at, uploaded_by, learning_item_id, is_video
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&form.title)
    .bind(&file.file_name)
    .bind(&content_type)
    .bind(file_size as i64)
    .bind(&file_url)
    .bind(&form.description)
    .bind(Utc::now())
    .bind(caller.id)
    .bind(form.learning_item_id)
    .bind(is_video)
    .fetch_one(pool)
    .await;

    let id = match inserted {
        Ok(id) => id,
        Err(e) => {
            if let Err(cleanup) = storage.delete(&file_url).await {
                tracing::error!("Failed to remove orphaned upload {}: {}", file_url, cleanup);
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        "{} uploaded document {} ({} bytes) to {}",
        caller.username,
        id,
        file_size,
        file_url
    );

    let mut conn = pool.acquire().await?;
    Ok(fetch_document(&mut conn, id).await?.into())
}

pub async fn get_document(pool: &SqlitePool, id: i64) -> Result<DocumentDto, AppError> {
    let mut conn = pool.acquire().await?;
    Ok(fetch_document(&mut conn, id).await?.into())
}

pub async fn documents_by_user(
    pool: &SqlitePool,
    caller: &CurrentUser,
) -> Result<Vec<DocumentDto>, AppError> {
    let documents = sqlx::query_as::<_, Document>(&format!(
        "{SELECT_DOCUMENT} WHERE d.uploaded_by = ? ORDER BY d.uploaded_at DESC, d.id DESC"
    ))
    .bind(caller.id)
    .fetch_all(pool)
    .await?;
    Ok(to_dtos(documents))
}

pub async fn documents_by_learning_item(
    pool: &SqlitePool,
    learning_item_id: i64,
) -> Result<Vec<DocumentDto>, AppError> {
    let mut conn = pool.acquire().await?;
    Ok(to_dtos(documents_of_item(&mut conn, learning_item_id).await?))
}

/// Documents not attached to any learning item.
pub async fn standalone_documents(pool: &SqlitePool) -> Result<Vec<DocumentDto>, AppError> {
    let documents = sqlx::query_as::<_, Document>(&format!(
        "{SELECT_DOCUMENT} WHERE d.learning_item_id IS NULL ORDER BY d.uploaded_at DESC, d.id DESC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(to_dtos(documents))
}

/// Case-insensitive match on title or description.
pub async fn search_documents(
    pool: &SqlitePool,
    keyword: &str,
) -> Result<Vec<DocumentDto>, AppError> {
    let pattern = like_pattern(keyword);
    let documents = sqlx::query_as::<_, Document>(&format!(
        r#"{SELECT_DOCUMENT}
        WHERE LOWER(d.title) LIKE ?1 ESCAPE '\'
           OR LOWER(COALESCE(d.description, '')) LIKE ?1 ESCAPE '\'
        ORDER BY d.uploaded_at DESC, d.id DESC"#
    ))
    .bind(&pattern)
    .fetch_all(pool)
    .await?;
    Ok(to_dtos(documents))
}

pub async fn update_document(
    pool: &SqlitePool,
    caller: &CurrentUser,
    id: i64,
    req: DocumentUpdateRequest,
) -> Result<DocumentDto, AppError> {
    let mut tx = begin_write(pool).await?;
    let document = fetch_document(&mut tx, id).await?;
    ensure_uploader(&document, caller, "update")?;

    if let Some(item_id) = req.learning_item_id {
        ensure_item_exists(&mut tx, item_id).await?;
    }

    let title = req
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(document.title);
    let description = req.description.or(document.description);
    let learning_item_id = req.learning_item_id.or(document.learning_item_id);

    sqlx::query(
        "UPDATE documents SET title = ?, description = ?, learning_item_id = ? WHERE id = ?",
    )
    .bind(&title)
    .bind(&description)
    .bind(learning_item_id)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    let updated = fetch_document(&mut tx, id).await?;
    tx.commit().await?;
    Ok(updated.into())
}

pub async fn associate_with_learning_item(
    pool: &SqlitePool,
    caller: &CurrentUser,
    id: i64,
    learning_item_id: i64,
) -> Result<DocumentDto, AppError> {
    set_learning_item(pool, caller, id, Some(learning_item_id)).await
}

pub async fn disassociate_from_learning_item(
    pool: &SqlitePool,
    caller: &CurrentUser,
    id: i64,
) -> Result<DocumentDto, AppError> {
    set_learning_item(pool, caller, id, None).await
}

async fn set_learning_item(
    pool: &SqlitePool,
    caller: &CurrentUser,
    id: i64,
    learning_item_id: Option<i64>,
) -> Result<DocumentDto, AppError> {
    let mut tx = begin_write(pool).await?;
    let document = fetch_document(&mut tx, id).await?;
    ensure_uploader(&document, caller, "update")?;

    if let Some(item_id) = learning_item_id {
        ensure_item_exists(&mut tx, item_id).await?;
    }

    sqlx::query("UPDATE documents SET learning_item_id = ? WHERE id = ?")
        .bind(learning_item_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let updated = fetch_document(&mut tx, id).await?;
    tx.commit().await?;
    Ok(updated.into())
}

async fn ensure_item_exists(conn: &mut SqliteConnection, item_id: i64) -> Result<(), AppError> {
    if learning_item::find_item(conn, item_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Learning item not found with id: {item_id}"
        )));
    }
    Ok(())
}

/// Removes the row, then the stored file. Only the uploader may do this;
/// anyone else gets 403 and the document is left untouched.
///
/// A file that cannot be removed once the row is gone is logged and left
/// behind as an orphan.
pub async fn delete_document(
    pool: &SqlitePool,
    storage: &dyn FileStorage,
    caller: &CurrentUser,
    id: i64,
) -> Result<(), AppError> {
    let mut tx = begin_write(pool).await?;
    let document = fetch_document(&mut tx, id).await?;
    ensure_uploader(&document, caller, "delete")?;

    sqlx::query("DELETE FROM documents WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    match storage.delete(&document.file_url).await {
        Ok(true) => {}
        Ok(false) => tracing::warn!("Stored file {} was already gone", document.file_url),
        Err(e) => tracing::error!(
            "Document {} deleted but its file {} was not removed: {}",
            id,
            document.file_url,
            e
        ),
    }

    tracing::info!("{} deleted document {}", caller.username, id);
    Ok(())
}
