// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use validator::Validate;

use crate::models::enums::QuestionType;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow)]
pub struct Question {
    pub id: i64,
    pub quiz_bank_id: i64,
    pub question_text: String,
    #[sqlx(try_from = "String")]
    pub question_type: QuestionType,
    /// Stored as a JSON array; decoded straight into a list.
    pub options: Json<Vec<String>>,
    pub correct_answer: String,
}

/// Authoring view, includes the correct answer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDto {
    pub id: i64,
    pub quiz_bank_id: i64,
    pub question_text: String,
    pub question_type: QuestionType,
    pub options: Vec<String>,
    pub correct_answer: String,
}

impl From<Question> for QuestionDto {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            quiz_bank_id: q.quiz_bank_id,
            question_text: q.question_text,
            question_type: q.question_type,
            options: q.options.0,
            correct_answer: q.correct_answer,
        }
    }
}

/// What a student sees while taking a quiz.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestionDto {
    pub id: i64,
    pub question_text: String,
    pub question_type: QuestionType,
    pub options: Vec<String>,
}

impl From<Question> for PublicQuestionDto {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            question_text: q.question_text,
            question_type: q.question_type,
            options: q.options.0,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuestionCreateRequest {
    #[validate(range(min = 1, message = "Quiz bank ID must be positive"))]
    pub quiz_bank_id: i64,
    #[validate(length(min = 1, max = 5000, message = "Question text is required"))]
    pub question_text: String,
    pub question_type: QuestionType,
    #[validate(length(min = 1, message = "At least one option is required"))]
    pub options: Vec<String>,
    #[validate(length(min = 1, max = 1000, message = "Correct answer is required"))]
    pub correct_answer: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuestionUpdateRequest {
    #[validate(length(min = 1, max = 5000, message = "Question text is required"))]
    pub question_text: String,
    pub question_type: QuestionType,
    #[validate(length(min = 1, message = "At least one option is required"))]
    pub options: Vec<String>,
    #[validate(length(min = 1, max = 1000, message = "Correct answer is required"))]
    pub correct_answer: String,
}

#[derive(Debug, Deserialize)]
pub struct RandomQuestionParams {
    pub count: Option<i64>,
}
