// src/handlers/enrollments.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        course::EnrollmentRequest,
        response::{ApiResponse, ok},
    },
    services::enrollment,
    utils::{extract::Json, jwt::CurrentUser},
};

pub async fn enroll(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Json(payload): Json<EnrollmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    enrollment::enroll(&pool, &user, payload.course_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::<()>::done("Enrolled successfully")),
    ))
}

pub async fn my_courses(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let courses = enrollment::my_courses(&pool, &user).await?;
    Ok(ok("Enrolled courses retrieved successfully", courses))
}
