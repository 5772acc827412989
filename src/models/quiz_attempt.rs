// src/models/quiz_attempt.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::{enums::QuizAttemptStatus, question::PublicQuestionDto};

/// Represents the 'quiz_attempts' table joined with display columns.
#[derive(Debug, Clone, FromRow)]
pub struct QuizAttempt {
    pub id: i64,
    pub student_id: i64,
    pub student_username: Option<String>,
    pub quiz_bank_id: i64,
    pub quiz_bank_title: Option<String>,
    pub learning_item_id: i64,
    pub learning_item_title: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_score: Option<i64>,
    pub max_possible_score: Option<i64>,
    #[sqlx(try_from = "String")]
    pub status: QuizAttemptStatus,
}

impl QuizAttempt {
    pub fn is_open(&self) -> bool {
        self.status == QuizAttemptStatus::InProgress
    }
}

/// Represents the 'student_responses' table with the question's text and key.
#[derive(Debug, Clone, FromRow)]
pub struct StudentResponse {
    pub id: i64,
    pub quiz_attempt_id: i64,
    pub question_id: i64,
    pub question_text: String,
    pub correct_answer: String,
    pub selected_answer: String,
    pub is_correct: bool,
    pub points_earned: i64,
}

/// Body of `POST /api/quizzes/attempt`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartAttemptRequest {
    #[validate(range(min = 1, message = "Learning item ID must be positive"))]
    pub learning_item_id: i64,
}

/// One element of the `PUT /api/quizzes/attempt/{id}/answers` array.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSubmission {
    #[validate(range(min = 1, message = "Question ID must be positive"))]
    pub question_id: i64,
    #[validate(length(max = 1000))]
    pub selected_answer: String,
}

/// Query string of `GET /api/quizzes/student/{studentId}/history`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryParams {
    pub learning_item_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttemptDto {
    pub id: i64,
    pub student_id: i64,
    pub student_username: Option<String>,
    pub quiz_bank_id: i64,
    pub quiz_bank_title: Option<String>,
    pub learning_item_id: i64,
    pub learning_item_title: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_score: Option<i64>,
    pub max_possible_score: Option<i64>,
    pub status: QuizAttemptStatus,
    pub percentage_score: f64,
}

impl From<QuizAttempt> for QuizAttemptDto {
    fn from(a: QuizAttempt) -> Self {
        let percentage_score =
            percentage(a.total_score.unwrap_or(0), a.max_possible_score.unwrap_or(0));
        Self {
            id: a.id,
            student_id: a.student_id,
            student_username: a.student_username,
            quiz_bank_id: a.quiz_bank_id,
            quiz_bank_title: a.quiz_bank_title,
            learning_item_id: a.learning_item_id,
            learning_item_title: a.learning_item_title,
            start_time: a.start_time,
            end_time: a.end_time,
            total_score: a.total_score,
            max_possible_score: a.max_possible_score,
            status: a.status,
            percentage_score,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentResponseDto {
    pub id: i64,
    pub question_id: i64,
    pub question_text: String,
    pub selected_answer: String,
    /// Only present once the attempt is completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    pub is_correct: bool,
    pub points_earned: i64,
}

impl StudentResponseDto {
    pub fn new(r: StudentResponse, reveal_answer: bool) -> Self {
        Self {
            id: r.id,
            question_id: r.question_id,
            question_text: r.question_text,
            selected_answer: r.selected_answer,
            correct_answer: reveal_answer.then_some(r.correct_answer),
            is_correct: r.is_correct,
            points_earned: r.points_earned,
        }
    }
}

/// Score summary of one attempt with the per-question breakdown.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResultDto {
    pub attempt_id: i64,
    pub quiz_bank_id: i64,
    pub quiz_bank_title: Option<String>,
    pub learning_item_id: i64,
    pub status: QuizAttemptStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_score: i64,
    pub max_possible_score: i64,
    pub percentage_score: f64,
    pub responses: Vec<StudentResponseDto>,
}

impl QuizResultDto {
    /// Completed attempts report their stored totals; open ones are scored
    /// from the responses recorded so far.
    pub fn new(attempt: QuizAttempt, responses: Vec<StudentResponse>) -> Self {
        let (total_score, max_possible_score) = match (attempt.total_score, attempt.max_possible_score) {
            (Some(total), Some(max)) => (total, max),
            _ => score(&responses),
        };
        let reveal_answers = !attempt.is_open();
        Self {
            attempt_id: attempt.id,
            quiz_bank_id: attempt.quiz_bank_id,
            quiz_bank_title: attempt.quiz_bank_title,
            learning_item_id: attempt.learning_item_id,
            status: attempt.status,
            start_time: attempt.start_time,
            end_time: attempt.end_time,
            total_score,
            max_possible_score,
            percentage_score: percentage(total_score, max_possible_score),
            responses: responses
                .into_iter()
                .map(|r| StudentResponseDto::new(r, reveal_answers))
                .collect(),
        }
    }
}

/// Attempt plus the bank's questions, answers stripped.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttemptWithQuestionsDto {
    pub attempt: QuizAttemptDto,
    pub questions: Vec<PublicQuestionDto>,
    pub answered_question_ids: Vec<i64>,
}

/// Grading is exact string equality, one point per correct answer.
pub fn grade(selected_answer: &str, correct_answer: &str) -> (bool, i64) {
    let correct = selected_answer == correct_answer;
    (correct, i64::from(correct))
}

/// `(total, max)` where max counts answered questions only.
pub fn score(responses: &[StudentResponse]) -> (i64, i64) {
    let total = responses.iter().map(|r| r.points_earned).sum();
    (total, responses.len() as i64)
}

/// `total / max * 100`, or 0 when nothing was answered.
pub fn percentage(total: i64, max: i64) -> f64 {
    if max == 0 {
        0.0
    } else {
        total as f64 / max as f64 * 100.0
    }
}
