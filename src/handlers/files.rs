// src/handlers/files.rs

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderValue, header},
    response::Response,
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::{
    config::Config,
    error::AppError,
    utils::{
        extract::Path,
        files::{content_type_for, is_streamable, resolve_under},
    },
};

/// `GET /files/{*path}`: serves a stored upload.
///
/// Range requests are answered by `ServeFile`. Media that plays in the
/// browser is sent inline, everything else as an attachment.
pub async fn serve_file(
    State(config): State<Config>,
    Path(path): Path<String>,
    req: Request,
) -> Result<Response, AppError> {
    let target = resolve_under(&config.upload_dir, &path)?;

    match tokio::fs::metadata(&target).await {
        Ok(meta) if meta.is_file() => {}
        _ => return Err(AppError::NotFound(format!("File not found: {path}"))),
    }

    let file_name = target
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("download")
        .to_string();

    let response = ServeFile::new(&target)
        .oneshot(req)
        .await
        .unwrap_or_else(|never| match never {});
    let mut response = response.map(Body::new);

    // ServeFile sets Content-Type; the extension table only covers files it
    // could not classify.
    let streamable = match response.headers().get(header::CONTENT_TYPE) {
        Some(value) => value.to_str().map(is_streamable).unwrap_or(false),
        None => is_streamable(content_type_for(&path)),
    };

    let disposition = if streamable {
        format!("inline; filename=\"{file_name}\"")
    } else {
        format!("attachment; filename=\"{file_name}\"")
    };
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let headers = response.headers_mut();
    if !headers.contains_key(header::CONTENT_TYPE) {
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(content_type_for(&path)),
        );
    }
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    if streamable {
        headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    }

    Ok(response)
}
