// src/handlers/documents.rs

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::{
        document::{DocumentSearchParams, DocumentUpdateRequest, DocumentUploadForm, UploadedFile},
        response::{ApiResponse, ok},
    },
    services::{document, storage::FileStorage},
    utils::{
        extract::{Json, Multipart, Path, Query},
        jwt::CurrentUser,
    },
};

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
}

/// Reads `file`, `title`, `description`, `learningItemId` and `isVideo` parts.
pub(crate) async fn read_upload(
    Multipart(mut multipart): Multipart,
) -> Result<(DocumentUploadForm, UploadedFile), AppError> {
    let mut form = DocumentUploadForm::default();
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some(UploadedFile {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "title" => form.title = field.text().await.map_err(multipart_error)?,
            "description" => {
                let text = field.text().await.map_err(multipart_error)?;
                form.description = Some(text).filter(|t| !t.is_empty());
            }
            "learningItemId" => {
                let text = field.text().await.map_err(multipart_error)?;
                if !text.trim().is_empty() {
                    let id = text.trim().parse::<i64>().map_err(|_| {
                        AppError::BadRequest("learningItemId must be a number".to_string())
                    })?;
                    form.learning_item_id = Some(id);
                }
            }
            "isVideo" => {
                let text = field.text().await.map_err(multipart_error)?;
                if !text.trim().is_empty() {
                    let flag = text.trim().parse::<bool>().map_err(|_| {
                        AppError::BadRequest("isVideo must be true or false".to_string())
                    })?;
                    form.is_video = Some(flag);
                }
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::BadRequest("Please select a file to upload".to_string()))?;
    form.validate()?;
    Ok((form, file))
}

/// `POST /documents` (multipart).
pub async fn upload_document(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    State(storage): State<Arc<dyn FileStorage>>,
    user: CurrentUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let (form, file) = read_upload(multipart).await?;
    let created =
        document::upload_document(&pool, storage.as_ref(), &config, &user, form, file).await?;
    Ok((StatusCode::CREATED, ok("Document uploaded successfully", created)))
}

pub async fn get_document(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let doc = document::get_document(&pool, id).await?;
    Ok(ok("Document retrieved successfully", doc))
}

pub async fn my_documents(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let docs = document::documents_by_user(&pool, &user).await?;
    Ok(ok("Documents retrieved successfully", docs))
}

pub async fn documents_by_learning_item(
    State(pool): State<SqlitePool>,
    Path(learning_item_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let docs = document::documents_by_learning_item(&pool, learning_item_id).await?;
    Ok(ok("Documents retrieved successfully", docs))
}

pub async fn standalone_documents(
    State(pool): State<SqlitePool>,
) -> Result<impl IntoResponse, AppError> {
    let docs = document::standalone_documents(&pool).await?;
    Ok(ok("Standalone documents retrieved successfully", docs))
}

pub async fn search_documents(
    State(pool): State<SqlitePool>,
    Query(params): Query<DocumentSearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let docs = document::search_documents(&pool, &params.keyword).await?;
    Ok(ok("Search results retrieved successfully", docs))
}

pub async fn update_document(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<DocumentUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let doc = document::update_document(&pool, &user, id, payload).await?;
    Ok(ok("Document updated successfully", doc))
}

/// `PUT /documents/{id}/associate/{learningItemId}`
pub async fn associate_document(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path((id, learning_item_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let doc = document::associate_with_learning_item(&pool, &user, id, learning_item_id).await?;
    Ok(ok("Document associated with learning item successfully", doc))
}

/// `PUT /documents/{id}/disassociate`
pub async fn disassociate_document(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let doc = document::disassociate_from_learning_item(&pool, &user, id).await?;
    Ok(ok("Document disassociated from learning item successfully", doc))
}

pub async fn delete_document(
    State(pool): State<SqlitePool>,
    State(storage): State<Arc<dyn FileStorage>>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    document::delete_document(&pool, storage.as_ref(), &user, id).await?;
    Ok(Json(ApiResponse::<()>::done("Document deleted successfully")))
}
