// src/models/quiz_bank.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'quiz_banks' table with its creator and question count.
#[derive(Debug, Clone, FromRow)]
pub struct QuizBank {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_by: i64,
    pub created_by_name: Option<String>,
    pub creation_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
    pub active: bool,
    pub question_count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizBankDto {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_by_id: i64,
    pub created_by_name: Option<String>,
    pub creation_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
    pub active: bool,
    pub question_count: i64,
}

impl From<QuizBank> for QuizBankDto {
    fn from(bank: QuizBank) -> Self {
        Self {
            id: bank.id,
            title: bank.title,
            description: bank.description,
            created_by_id: bank.created_by,
            created_by_name: bank.created_by_name,
            creation_date: bank.creation_date,
            last_modified_date: bank.last_modified_date,
            active: bank.active,
            question_count: bank.question_count,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuizBankCreateRequest {
    #[validate(length(min = 1, max = 255, message = "Quiz bank title is required"))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

/// Patch body; a blank or missing title keeps the current one.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuizBankUpdateRequest {
    #[validate(length(max = 255))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub active: Option<bool>,
}

/// Body of `PUT /api/quiz-banks/{id}/learning-items`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuizBankAssociationRequest {
    #[validate(range(min = 1, message = "Learning item ID must be specified"))]
    pub learning_item_id: i64,
}
