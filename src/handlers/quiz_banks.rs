// src/handlers/quiz_banks.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        quiz_bank::{QuizBankAssociationRequest, QuizBankCreateRequest, QuizBankUpdateRequest},
        response::{ApiResponse, ok},
    },
    services::quiz_bank,
    utils::{extract::{Json, Path}, jwt::CurrentUser},
};

pub async fn create_bank(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Json(payload): Json<QuizBankCreateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let created = quiz_bank::create_bank(&pool, &user, payload).await?;
    Ok((StatusCode::CREATED, ok("Quiz bank created successfully", created)))
}

pub async fn get_bank(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let bank = quiz_bank::get_bank(&pool, id).await?;
    Ok(ok("Quiz bank retrieved successfully", bank))
}

pub async fn active_banks(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let banks = quiz_bank::active_banks(&pool).await?;
    Ok(ok("Quiz banks retrieved successfully", banks))
}

pub async fn banks_by_teacher(
    State(pool): State<SqlitePool>,
    Path(teacher_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let banks = quiz_bank::banks_by_teacher(&pool, teacher_id).await?;
    Ok(ok("Quiz banks retrieved successfully", banks))
}

pub async fn update_bank(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<QuizBankUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let bank = quiz_bank::update_bank(&pool, id, payload).await?;
    Ok(ok("Quiz bank updated successfully", bank))
}

pub async fn delete_bank(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    quiz_bank::delete_bank(&pool, id).await?;
    Ok(Json(ApiResponse::<()>::done("Quiz bank deleted successfully")))
}

/// `PUT /quiz-banks/{id}/learning-items`
pub async fn associate_learning_item(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<QuizBankAssociationRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let item = quiz_bank::associate_learning_item(&pool, id, payload.learning_item_id).await?;
    Ok(ok("Quiz bank associated with learning item successfully", item))
}
