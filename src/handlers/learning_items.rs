// src/handlers/learning_items.rs

use std::sync::Arc;

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    handlers::documents::read_upload,
    models::{
        enums::LearningItemType,
        learning_item::{LearningItemCreateRequest, LearningItemUpdateRequest},
        response::{ApiResponse, ok},
    },
    services::{learning_item, storage::FileStorage},
    utils::{
        extract::{Json, Multipart, Path},
        jwt::CurrentUser,
    },
};

pub async fn create_item(
    State(pool): State<SqlitePool>,
    Json(payload): Json<LearningItemCreateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let created = learning_item::create_item(&pool, payload).await?;
    Ok((StatusCode::CREATED, ok("Learning item created successfully", created)))
}

pub async fn get_item(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let item = learning_item::get_item(&pool, id).await?;
    Ok(ok("Learning item retrieved successfully", item))
}

pub async fn items_by_week(
    State(pool): State<SqlitePool>,
    Path(week_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let items = learning_item::items_by_week(&pool, week_id, None).await?;
    Ok(ok("Learning items retrieved successfully", items))
}

/// `GET /learning-items/week/{weekId}/type/{type}`
pub async fn items_by_week_and_type(
    State(pool): State<SqlitePool>,
    Path((week_id, item_type)): Path<(i64, LearningItemType)>,
) -> Result<impl IntoResponse, AppError> {
    let items = learning_item::items_by_week(&pool, week_id, Some(item_type)).await?;
    Ok(ok("Learning items retrieved successfully", items))
}

pub async fn update_item(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<LearningItemUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let item = learning_item::update_item(&pool, id, payload).await?;
    Ok(ok("Learning item updated successfully", item))
}

/// Body is the item ids of the week in their new order.
pub async fn reorder_items(
    State(pool): State<SqlitePool>,
    Path(week_id): Path<i64>,
    Json(item_ids): Json<Vec<i64>>,
) -> Result<impl IntoResponse, AppError> {
    let items = learning_item::reorder_items(&pool, week_id, &item_ids).await?;
    Ok(ok("Learning items reordered successfully", items))
}

pub async fn delete_item(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    learning_item::delete_item(&pool, id).await?;
    Ok(Json(ApiResponse::<()>::done("Learning item deleted successfully")))
}

pub async fn upload_item_document(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    State(storage): State<Arc<dyn FileStorage>>,
    user: CurrentUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let (form, file) = read_upload(multipart).await?;
    let created = learning_item::upload_item_document(
        &pool,
        storage.as_ref(),
        &config,
        &user,
        id,
        form,
        file,
    )
    .await?;
    Ok((StatusCode::CREATED, ok("Document uploaded successfully", created)))
}

pub async fn remove_item_document(
    State(pool): State<SqlitePool>,
    State(storage): State<Arc<dyn FileStorage>>,
    user: CurrentUser,
    Path((item_id, document_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    learning_item::remove_item_document(&pool, storage.as_ref(), &user, item_id, document_id)
        .await?;
    Ok(Json(ApiResponse::<()>::done(
        "Document removed from learning item successfully",
    )))
}

/// Redirects to the item's first document.
pub async fn download_item_document(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let url = learning_item::download_url(&pool, id).await?;
    Ok((StatusCode::FOUND, [(header::LOCATION, url)]))
}
