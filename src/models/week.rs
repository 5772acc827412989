// src/models/week.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::learning_item::LearningItemDto;

/// Represents the 'weeks' table in the database.
#[derive(Debug, Clone, FromRow)]
pub struct Week {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub week_number: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekDto {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub week_number: i32,
    pub learning_items: Vec<LearningItemDto>,
}

impl WeekDto {
    pub fn new(week: Week, learning_items: Vec<LearningItemDto>) -> Self {
        Self {
            id: week.id,
            course_id: week.course_id,
            title: week.title,
            description: week.description,
            week_number: week.week_number,
            learning_items,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WeekCreateRequest {
    #[validate(range(min = 1, message = "Course ID must be positive"))]
    pub course_id: i64,
    #[validate(length(min = 1, max = 255, message = "Week title is required"))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 1, message = "Week number must be at least 1"))]
    pub week_number: i32,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WeekUpdateRequest {
    #[validate(length(min = 1, max = 255, message = "Week title is required"))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 1, message = "Week number must be at least 1"))]
    pub week_number: i32,
}
