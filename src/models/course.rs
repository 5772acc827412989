// src/models/course.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;
use validator::Validate;

use crate::models::week::WeekDto;

/// Represents the 'courses' table joined with the teacher's display name.
#[derive(Debug, Clone, FromRow)]
pub struct CourseRow {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub price: f64,
    pub is_free: bool,
    pub is_draft: bool,
    pub estimated_weeks: Option<i32>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub teacher_id: Option<i64>,
    pub teacher_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Lesson count and total minutes over every item of a course.
#[derive(Debug, Clone, Copy, Default, FromRow)]
pub struct CourseTotals {
    pub number_of_lessons: i64,
    pub total_duration_minutes: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDto {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub price: f64,
    pub is_free: bool,
    pub is_draft: bool,
    pub number_of_lessons: i64,
    pub total_duration_minutes: i64,
    pub estimated_weeks: Option<i32>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub teacher_id: Option<i64>,
    pub teacher_name: Option<String>,
}

impl CourseDto {
    pub fn from_row(row: CourseRow, totals: CourseTotals) -> Self {
        Self {
            id: row.id,
            name: row.name,
            category: row.category,
            price: row.price,
            is_free: row.is_free,
            is_draft: row.is_draft,
            number_of_lessons: totals.number_of_lessons,
            total_duration_minutes: totals.total_duration_minutes,
            estimated_weeks: row.estimated_weeks,
            summary: row.summary,
            description: row.description,
            thumbnail_url: row.thumbnail_url,
            teacher_id: row.teacher_id,
            teacher_name: row.teacher_name,
        }
    }
}

/// Published course with its full week/item outline.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetailDto {
    #[serde(flatten)]
    pub course: CourseDto,
    pub weeks: Vec<WeekDto>,
}

/// DTO for creating or replacing a course.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CourseCreateRequest {
    #[validate(length(min = 1, max = 255, message = "Course name is required"))]
    pub name: String,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub is_free: bool,
    #[serde(default)]
    pub is_draft: bool,
    #[validate(range(min = 0, max = 520))]
    pub estimated_weeks: Option<i32>,
    #[validate(length(max = 500, message = "Summary must be less than 500 characters"))]
    pub summary: Option<String>,
    #[validate(length(max = 20000))]
    pub description: Option<String>,
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub thumbnail_url: Option<String>,
}

/// Validates that a string is a correctly formatted URL.
fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}

/// Query parameters for the published course catalogue.
#[derive(Debug, Deserialize)]
pub struct CourseListParams {
    pub name: Option<String>,
    pub teacher: Option<String>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentRequest {
    #[validate(range(min = 1, message = "Course ID must be positive"))]
    pub course_id: i64,
}
