// src/handlers/auth.rs

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::{
        enums::UserRole,
        response::{ApiResponse, ok},
        user::{LoginRequest, RegistrationRequest, VerifyEmailParams},
    },
    services::{mail::Mailer, user},
    utils::extract::{Json, Query},
};

async fn register(
    pool: SqlitePool,
    config: Config,
    mailer: Arc<dyn Mailer>,
    role: UserRole,
    payload: RegistrationRequest,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let response = user::register(&pool, &config, mailer.as_ref(), role, payload).await?;
    Ok((
        StatusCode::CREATED,
        ok("Registration successful. Please verify your email.", response),
    ))
}

/// `POST /register/student`
pub async fn register_student(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    State(mailer): State<Arc<dyn Mailer>>,
    Json(payload): Json<RegistrationRequest>,
) -> Result<impl IntoResponse, AppError> {
    register(pool, config, mailer, UserRole::Student, payload).await
}

/// `POST /register/teacher`
pub async fn register_teacher(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    State(mailer): State<Arc<dyn Mailer>>,
    Json(payload): Json<RegistrationRequest>,
) -> Result<impl IntoResponse, AppError> {
    register(pool, config, mailer, UserRole::Teacher, payload).await
}

/// `GET /verify-email?token=...`, the link sent by mail.
pub async fn verify_email(
    State(pool): State<SqlitePool>,
    Query(params): Query<VerifyEmailParams>,
) -> Result<impl IntoResponse, AppError> {
    user::verify_email(&pool, &params.token).await?;
    Ok(Json(ApiResponse::<()>::done(
        "Email verified successfully. You can now log in.",
    )))
}

/// Authenticates a user and returns a JWT token with the profile.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let response = user::login(&pool, &config, &payload).await?;
    Ok(ok("Login successful", response))
}
