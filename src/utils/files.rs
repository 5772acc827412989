// src/utils/files.rs

use std::path::{Component, Path, PathBuf};

use crate::error::AppError;

pub const HLS_PLAYLIST: &str = "application/vnd.apple.mpegurl";

/// Guesses a MIME type from the file extension.
pub fn content_type_for(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "zip" => "application/zip",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "ts" => "video/mp2t",
        "m3u8" => HLS_PLAYLIST,
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",
        _ => "application/octet-stream",
    }
}

/// Media that browsers play in place and seek with range requests.
pub fn is_streamable(content_type: &str) -> bool {
    content_type.starts_with("video/")
        || content_type.starts_with("audio/")
        || content_type == HLS_PLAYLIST
        || content_type == "application/x-mpegurl"
}

/// Uploads flagged as video lessons.
pub fn is_video(content_type: &str) -> bool {
    content_type.starts_with("video/")
        || content_type == HLS_PLAYLIST
        || content_type == "application/x-mpegurl"
}

/// Turns a client supplied relative path into one below `root`.
/// Absolute paths and `..` segments are refused.
pub fn resolve_under(root: &Path, relative: &str) -> Result<PathBuf, AppError> {
    let relative = Path::new(relative);
    let mut resolved = root.to_path_buf();
    let mut depth = 0;

    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            _ => return Err(AppError::BadRequest("Invalid file path".to_string())),
        }
    }

    if depth == 0 {
        return Err(AppError::BadRequest("Invalid file path".to_string()));
    }
    Ok(resolved)
}

/// Extension of an uploaded file name, including the dot (".pdf"), or "".
pub fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}
