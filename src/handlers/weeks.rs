// src/handlers/weeks.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        response::{ApiResponse, ok},
        week::{WeekCreateRequest, WeekUpdateRequest},
    },
    services::week,
    utils::extract::{Json, Path},
};

pub async fn weeks_by_course(
    State(pool): State<SqlitePool>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let weeks = week::weeks_by_course(&pool, course_id).await?;
    Ok(ok("Weeks retrieved successfully", weeks))
}

pub async fn get_week(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let week = week::get_week(&pool, id).await?;
    Ok(ok("Week retrieved successfully", week))
}

pub async fn create_week(
    State(pool): State<SqlitePool>,
    Json(payload): Json<WeekCreateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let created = week::create_week(&pool, payload).await?;
    Ok((StatusCode::CREATED, ok("Week created successfully", created)))
}

pub async fn update_week(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<WeekUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let updated = week::update_week(&pool, id, payload).await?;
    Ok(ok("Week updated successfully", updated))
}

pub async fn delete_week(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    week::delete_week(&pool, id).await?;
    Ok(Json(ApiResponse::<()>::done("Week deleted successfully")))
}
