// src/services/enrollment.rs

use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    error::{AppError, is_unique_violation},
    models::{
        course::{CourseDto, CourseRow},
        enums::UserRole,
    },
    services::{begin_write, course},
    utils::jwt::CurrentUser,
};

const ALREADY_ENROLLED: &str = "Student is already enrolled in this course.";

pub async fn enroll(pool: &SqlitePool, caller: &CurrentUser, course_id: i64) -> Result<(), AppError> {
    if caller.role != UserRole::Student {
        return Err(AppError::Forbidden(
            "Only students can enroll in courses".to_string(),
        ));
    }

    let mut tx = begin_write(pool).await?;

    let course = course::find_course(&mut tx, course_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Course not found with id: {course_id}")))?;

    if course.is_draft {
        return Err(AppError::BadRequest(
            "Cannot enroll in a draft course.".to_string(),
        ));
    }

    let existing: Option<i64> =
        sqlx::query_scalar("SELECT course_id FROM enrollments WHERE student_id = ? AND course_id = ?")
            .bind(caller.id)
            .bind(course_id)
            .fetch_optional(&mut *tx)
            .await?;
    if existing.is_some() {
        return Err(AppError::BadRequest(ALREADY_ENROLLED.to_string()));
    }

    sqlx::query("INSERT INTO enrollments (student_id, course_id, enrolled_at) VALUES (?, ?, ?)")
        .bind(caller.id)
        .bind(course_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::BadRequest(ALREADY_ENROLLED.to_string())
            } else {
                AppError::from(e)
            }
        })?;

    tx.commit().await?;

    tracing::info!("{} enrolled in course {}", caller.username, course_id);
    Ok(())
}

/// Courses the caller is enrolled in, most recent enrollment first.
pub async fn my_courses(pool: &SqlitePool, caller: &CurrentUser) -> Result<Vec<CourseDto>, AppError> {
    let mut conn = pool.acquire().await?;
    let rows = sqlx::query_as::<_, CourseRow>(
        r#"
        SELECT
            c.id, c.name, c.category, c.price, c.is_free, c.is_draft, c.estimated_weeks,
            c.summary, c.description, c.thumbnail_url, c.teacher_id,
            u.name AS teacher_name, c.created_at
        FROM enrollments e
        JOIN courses c ON c.id = e.course_id
        LEFT JOIN users u ON u.id = c.teacher_id
        WHERE e.student_id = ?
        ORDER BY e.enrolled_at DESC, c.id DESC
        "#,
    )
    .bind(caller.id)
    .fetch_all(&mut *conn)
    .await?;

    course::to_dtos(&mut conn, rows).await
}
