// src/models/learning_item.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::{document::DocumentDto, enums::LearningItemType};

/// Represents the 'learning_items' table in the database.
#[derive(Debug, Clone, FromRow)]
pub struct LearningItem {
    pub id: i64,
    pub week_id: i64,
    pub title: String,
    #[sqlx(rename = "type", try_from = "String")]
    pub item_type: LearningItemType,
    pub content: Option<String>,
    pub duration_minutes: i32,
    pub order_index: i32,
    pub quiz_bank_id: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningItemDto {
    pub id: i64,
    pub week_id: i64,
    pub title: String,
    #[serde(rename = "type")]
    pub item_type: LearningItemType,
    pub content: Option<String>,
    pub duration_minutes: i32,
    pub order_index: i32,
    pub quiz_bank_id: Option<i64>,
    pub documents: Vec<DocumentDto>,
}

impl LearningItemDto {
    pub fn new(item: LearningItem, documents: Vec<DocumentDto>) -> Self {
        Self {
            id: item.id,
            week_id: item.week_id,
            title: item.title,
            item_type: item.item_type,
            content: item.content,
            duration_minutes: item.duration_minutes,
            order_index: item.order_index,
            quiz_bank_id: item.quiz_bank_id,
            documents,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LearningItemCreateRequest {
    #[validate(range(min = 1, message = "Week ID must be positive"))]
    pub week_id: i64,
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,
    #[serde(rename = "type")]
    pub item_type: LearningItemType,
    #[validate(length(max = 50000))]
    pub content: Option<String>,
    #[validate(range(min = 0, message = "Duration cannot be negative"))]
    pub duration_minutes: Option<i32>,
    #[validate(range(min = 0))]
    pub order_index: Option<i32>,
    pub quiz_bank_id: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LearningItemUpdateRequest {
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,
    #[serde(rename = "type")]
    pub item_type: LearningItemType,
    #[validate(length(max = 50000))]
    pub content: Option<String>,
    #[validate(range(min = 0, message = "Duration cannot be negative"))]
    pub duration_minutes: Option<i32>,
    #[validate(range(min = 0))]
    pub order_index: Option<i32>,
    pub quiz_bank_id: Option<i64>,
}
