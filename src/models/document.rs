// src/models/document.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'documents' table joined with the uploader's username.
#[derive(Debug, Clone, FromRow)]
pub struct Document {
    pub id: i64,
    pub title: String,
    pub file_name: String,
    pub content_type: String,
    pub file_size: i64,
    pub file_url: String,
    pub description: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by: i64,
    pub uploaded_by_username: Option<String>,
    pub learning_item_id: Option<i64>,
    pub is_video: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDto {
    pub id: i64,
    pub title: String,
    pub file_name: String,
    pub content_type: String,
    pub file_size: i64,
    pub file_url: String,
    pub description: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by_id: i64,
    pub uploaded_by_username: Option<String>,
    pub learning_item_id: Option<i64>,
    pub is_video: bool,
}

impl From<Document> for DocumentDto {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            title: doc.title,
            file_name: doc.file_name,
            content_type: doc.content_type,
            file_size: doc.file_size,
            file_url: doc.file_url,
            description: doc.description,
            uploaded_at: doc.uploaded_at,
            uploaded_by_id: doc.uploaded_by,
            uploaded_by_username: doc.uploaded_by_username,
            learning_item_id: doc.learning_item_id,
            is_video: doc.is_video,
        }
    }
}

/// The file part of a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Non-file fields of a multipart upload.
#[derive(Debug, Default, Validate)]
pub struct DocumentUploadForm {
    #[validate(length(min = 1, max = 255, message = "Document title is required"))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub learning_item_id: Option<i64>,
    /// Explicit override of the content-type based detection.
    pub is_video: Option<bool>,
}

/// Patch body for `PUT /documents/{id}`; absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUpdateRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub learning_item_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct DocumentSearchParams {
    pub keyword: String,
}
