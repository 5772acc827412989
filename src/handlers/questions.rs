// src/handlers/questions.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        question::{QuestionCreateRequest, QuestionUpdateRequest, RandomQuestionParams},
        response::{ApiResponse, ok},
    },
    services::question,
    utils::extract::{Json, Path, Query},
};

pub async fn create_question(
    State(pool): State<SqlitePool>,
    Json(payload): Json<QuestionCreateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let created = question::create_question(&pool, payload).await?;
    Ok((StatusCode::CREATED, ok("Question created successfully", created)))
}

pub async fn get_question(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let found = question::get_question(&pool, id).await?;
    Ok(ok("Question retrieved successfully", found))
}

pub async fn questions_by_bank(
    State(pool): State<SqlitePool>,
    Path(quiz_bank_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let questions = question::questions_by_bank(&pool, quiz_bank_id).await?;
    Ok(ok("Questions retrieved successfully", questions))
}

/// `GET /questions/quiz-bank/{quizBankId}/random?count=N`
pub async fn random_questions(
    State(pool): State<SqlitePool>,
    Path(quiz_bank_id): Path<i64>,
    Query(params): Query<RandomQuestionParams>,
) -> Result<impl IntoResponse, AppError> {
    let questions = question::random_questions(&pool, quiz_bank_id, params.count).await?;
    Ok(ok("Random questions retrieved successfully", questions))
}

pub async fn update_question(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<QuestionUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let updated = question::update_question(&pool, id, payload).await?;
    Ok(ok("Question updated successfully", updated))
}

pub async fn delete_question(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    question::delete_question(&pool, id).await?;
    Ok(Json(ApiResponse::<()>::done("Question deleted successfully")))
}
