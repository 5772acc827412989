// src/services/storage.rs

use std::path::PathBuf;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    config::{Config, StorageBackend},
    error::AppError,
    utils::files::{extension_of, resolve_under},
};

/// URL prefix under which `LocalFileStorage` files are served.
pub const LOCAL_FILES_PREFIX: &str = "/files/";

/// Where uploaded bytes live. Returns the public URL stored on the document row.
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn store(
        &self,
        directory: &str,
        original_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, AppError>;

    /// `Ok(false)` when there was nothing to delete.
    async fn delete(&self, file_url: &str) -> Result<bool, AppError>;
}

/// Random file name keeping the original extension.
fn unique_name(original_name: &str) -> String {
    format!("{}{}", Uuid::new_v4(), extension_of(original_name))
}

/// Files under a root directory, served back by `GET /files/{*path}`.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store(
        &self,
        directory: &str,
        original_name: &str,
        _content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, AppError> {
        if bytes.is_empty() {
            return Err(AppError::BadRequest("Failed to store empty file".to_string()));
        }

        let relative = format!("{}/{}", directory.trim_matches('/'), unique_name(original_name));
        let target = resolve_under(&self.root, &relative)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;

        tracing::info!("File saved: {}", target.display());
        Ok(format!("{LOCAL_FILES_PREFIX}{relative}"))
    }

    async fn delete(&self, file_url: &str) -> Result<bool, AppError> {
        let relative = file_url.strip_prefix(LOCAL_FILES_PREFIX).unwrap_or(file_url);
        let path = resolve_under(&self.root, relative)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => {
                tracing::error!("Error deleting file {}: {}", path.display(), e);
                Err(e.into())
            }
        }
    }
}

/// Bucket on an HTTP object store: `PUT`/`DELETE <url>/<bucket>/<path>`.
#[derive(Debug, Clone)]
pub struct ObjectFileStorage {
    client: reqwest::Client,
    base_url: String,
    key: String,
    bucket: String,
}

impl ObjectFileStorage {
    pub fn new(base_url: &str, key: &str, bucket: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            bucket: bucket.to_string(),
        }
    }

    fn bucket_url(&self) -> String {
        format!("{}/{}/", self.base_url, self.bucket)
    }
}

#[async_trait]
impl FileStorage for ObjectFileStorage {
    async fn store(
        &self,
        directory: &str,
        original_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, AppError> {
        if bytes.is_empty() {
            return Err(AppError::BadRequest("Failed to store empty file".to_string()));
        }

        let url = format!(
            "{}{}/{}",
            self.bucket_url(),
            directory.trim_matches('/'),
            unique_name(original_name)
        );
        tracing::info!("Uploading file to: {}", url);

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.key)
            .header("apikey", &self.key)
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::InternalServerError(format!("Error uploading file: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Object store rejected upload ({}): {}", status, body);
            return Err(AppError::InternalServerError(format!(
                "Failed to upload file: {status}"
            )));
        }

        Ok(url)
    }

    async fn delete(&self, file_url: &str) -> Result<bool, AppError> {
        let bucket_url = self.bucket_url();
        let Some(path) = file_url.strip_prefix(&bucket_url) else {
            tracing::warn!("File {} is not in bucket {}", file_url, self.bucket);
            return Ok(false);
        };

        let response = self
            .client
            .delete(format!("{bucket_url}{path}"))
            .bearer_auth(&self.key)
            .header("apikey", &self.key)
            .send()
            .await
            .map_err(|e| AppError::InternalServerError(format!("Error deleting file: {e}")))?;

        if response.status().is_success() {
            tracing::info!("File deleted: {}", file_url);
            Ok(true)
        } else {
            tracing::warn!("Failed to delete file {}: {}", file_url, response.status());
            Ok(false)
        }
    }
}

/// Builds the storage selected by `STORAGE_BACKEND`.
pub fn from_config(config: &Config) -> std::sync::Arc<dyn FileStorage> {
    match &config.storage {
        StorageBackend::Local => std::sync::Arc::new(LocalFileStorage::new(&config.upload_dir)),
        StorageBackend::Object { url, key, bucket } => {
            std::sync::Arc::new(ObjectFileStorage::new(url, key, bucket))
        }
    }
}
