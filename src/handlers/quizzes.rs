// src/handlers/quizzes.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        quiz_attempt::{AnswerSubmission, HistoryParams, StartAttemptRequest},
        response::ok,
    },
    services::quiz_attempt,
    utils::{extract::{Json, Path, Query}, jwt::CurrentUser},
};

/// `POST /quizzes/attempt`
pub async fn start_attempt(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Json(payload): Json<StartAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let attempt = quiz_attempt::start_attempt(&pool, &user, payload.learning_item_id).await?;
    Ok((StatusCode::CREATED, ok("Quiz attempt started successfully", attempt)))
}

/// `PUT /quizzes/attempt/{attemptId}/answers`
pub async fn submit_answers(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(attempt_id): Path<i64>,
    Json(answers): Json<Vec<AnswerSubmission>>,
) -> Result<impl IntoResponse, AppError> {
    for answer in &answers {
        answer.validate()?;
    }
    let responses = quiz_attempt::submit_all_answers(&pool, &user, attempt_id, &answers).await?;
    Ok(ok("Answers submitted successfully", responses))
}

/// `PUT /quizzes/attempt/{attemptId}/complete`
pub async fn complete_attempt(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = quiz_attempt::complete_attempt(&pool, &user, attempt_id).await?;
    Ok(ok("Quiz attempt completed successfully", result))
}

pub async fn get_attempt(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = quiz_attempt::get_attempt(&pool, &user, attempt_id).await?;
    Ok(ok("Quiz attempt retrieved successfully", attempt))
}

pub async fn get_results(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = quiz_attempt::get_results(&pool, &user, attempt_id).await?;
    Ok(ok("Quiz results retrieved successfully", result))
}

/// Questions for taking the quiz, without correct answers.
pub async fn attempt_questions(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = quiz_attempt::get_attempt_with_questions(&pool, &user, attempt_id).await?;
    Ok(ok("Quiz questions retrieved successfully", attempt))
}

pub async fn attempts_by_student(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(student_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = quiz_attempt::attempts_by_student(&pool, &user, student_id).await?;
    Ok(ok("Quiz attempts retrieved successfully", attempts))
}

/// `GET /quizzes/student/{studentId}/history?learningItemId=N`
pub async fn student_history(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(student_id): Path<i64>,
    Query(params): Query<HistoryParams>,
) -> Result<impl IntoResponse, AppError> {
    let history =
        quiz_attempt::student_history(&pool, &user, student_id, params.learning_item_id).await?;
    Ok(ok("Quiz history retrieved successfully", history))
}
