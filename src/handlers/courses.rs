// src/handlers/courses.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        course::{CourseCreateRequest, CourseListParams},
        response::{ApiResponse, ok},
    },
    services::course,
    utils::{extract::{Json, Path, Query}, jwt::CurrentUser},
};

/// `GET /courses?name=&teacher=&page=&size=`
pub async fn list_courses(
    State(pool): State<SqlitePool>,
    Query(params): Query<CourseListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = course::published_courses(&pool, &params).await?;
    Ok(ok("Courses retrieved successfully", page))
}

pub async fn get_course(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let detail = course::course_detail(&pool, id).await?;
    Ok(ok("Course retrieved successfully", detail))
}

/// Courses owned by the calling teacher, drafts included.
pub async fn teaching_courses(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let courses = course::teaching_courses(&pool, &user).await?;
    Ok(ok("Courses retrieved successfully", courses))
}

pub async fn create_course(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Json(payload): Json<CourseCreateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let created = course::create_course(&pool, &user, payload).await?;
    Ok((StatusCode::CREATED, ok("Course created successfully", created)))
}

pub async fn update_course(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<CourseCreateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let updated = course::update_course(&pool, &user, id, payload).await?;
    Ok(ok("Course updated successfully", updated))
}

pub async fn delete_course(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    course::delete_course(&pool, &user, id).await?;
    Ok(Json(ApiResponse::<()>::done("Course deleted successfully")))
}
