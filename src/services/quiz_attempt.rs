// src/services/quiz_attempt.rs

//! Quiz attempt lifecycle: start, answer, complete, and the read projections.
//!
//! An attempt is created `IN_PROGRESS`, accepts each question of its bank at
//! most once, and becomes `COMPLETED` exactly once. Both one-shot rules are
//! checked here and backed by unique indexes in the schema.

use std::collections::HashSet;

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    error::{AppError, is_unique_violation},
    models::{
        enums::{LearningItemType, QuizAttemptStatus},
        learning_item::LearningItem,
        question::{PublicQuestionDto, Question},
        quiz_attempt::{
            AnswerSubmission, QuizAttempt, QuizAttemptDto, QuizAttemptWithQuestionsDto,
            QuizResultDto, StudentResponse, StudentResponseDto, grade, score,
        },
    },
    services::{begin_write, learning_item, question, user},
    utils::jwt::CurrentUser,
};

const ATTEMPT_IN_PROGRESS: &str = "There is already an in-progress quiz attempt";
const ATTEMPT_COMPLETED: &str = "This quiz attempt is already completed";

const SELECT_ATTEMPT: &str = r#"
    SELECT
        a.id,
        a.student_id,
        u.username AS student_username,
        a.quiz_bank_id,
        b.title AS quiz_bank_title,
        a.learning_item_id,
        li.title AS learning_item_title,
        a.start_time,
        a.end_time,
        a.total_score,
        a.max_possible_score,
        a.status
    FROM quiz_attempts a
    LEFT JOIN users u ON u.id = a.student_id
    LEFT JOIN quiz_banks b ON b.id = a.quiz_bank_id
    LEFT JOIN learning_items li ON li.id = a.learning_item_id
"#;

const SELECT_RESPONSE: &str = r#"
    SELECT
        r.id,
        r.quiz_attempt_id,
        r.question_id,
        q.question_text,
        q.correct_answer,
        r.selected_answer,
        r.is_correct,
        r.points_earned
    FROM student_responses r
    JOIN questions q ON q.id = r.question_id
"#;

pub(crate) async fn find_attempt(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<QuizAttempt>, AppError> {
    let attempt = sqlx::query_as::<_, QuizAttempt>(&format!("{SELECT_ATTEMPT} WHERE a.id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(attempt)
}

async fn fetch_attempt(conn: &mut SqliteConnection, id: i64) -> Result<QuizAttempt, AppError> {
    find_attempt(conn, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Quiz attempt not found".to_string()))
}

async fn fetch_responses(
    conn: &mut SqliteConnection,
    attempt_id: i64,
) -> Result<Vec<StudentResponse>, AppError> {
    let responses = sqlx::query_as::<_, StudentResponse>(&format!(
        "{SELECT_RESPONSE} WHERE r.quiz_attempt_id = ? ORDER BY r.id"
    ))
    .bind(attempt_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(responses)
}

/// Only the attempt's student (or an admin) may act on it.
fn ensure_owner(attempt: &QuizAttempt, caller: &CurrentUser) -> Result<(), AppError> {
    if attempt.student_id == caller.id || caller.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You can only access your own quiz attempts".to_string(),
        ))
    }
}

/// Students read their own attempts; teachers and admins read any.
fn ensure_reader(student_id: i64, caller: &CurrentUser) -> Result<(), AppError> {
    if student_id == caller.id || caller.role.can_author() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You can only view your own quiz attempts".to_string(),
        ))
    }
}

/// Opens a new attempt of a QUIZ learning item for the calling student.
pub async fn start_attempt(
    pool: &SqlitePool,
    caller: &CurrentUser,
    learning_item_id: i64,
) -> Result<QuizAttemptDto, AppError> {
    let mut tx = begin_write(pool).await?;

    if !user::exists(&mut tx, caller.id).await? {
        return Err(AppError::NotFound("Student not found".to_string()));
    }

    let item: LearningItem = learning_item::find_item(&mut tx, learning_item_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Learning item not found".to_string()))?;

    if item.item_type != LearningItemType::Quiz {
        return Err(AppError::BadRequest("Learning item is not a quiz".to_string()));
    }

    let quiz_bank_id = item.quiz_bank_id.ok_or_else(|| {
        AppError::BadRequest("No quiz bank associated with this learning item".to_string())
    })?;

    let open: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM quiz_attempts WHERE student_id = ? AND learning_item_id = ? AND status = ?",
    )
    .bind(caller.id)
    .bind(learning_item_id)
    .bind(QuizAttemptStatus::InProgress.as_str())
    .fetch_optional(&mut *tx)
    .await?;

    if let Some(open_id) = open {
        tracing::warn!(
            "Student {} already has attempt {} open on item {}",
            caller.id,
            open_id,
            learning_item_id
        );
        return Err(AppError::BadRequest(ATTEMPT_IN_PROGRESS.to_string()));
    }

    let attempt_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO quiz_attempts (student_id, quiz_bank_id, learning_item_id, start_time, status)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(caller.id)
    .bind(quiz_bank_id)
    .bind(learning_item_id)
    .bind(Utc::now())
    .bind(QuizAttemptStatus::InProgress.as_str())
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::BadRequest(ATTEMPT_IN_PROGRESS.to_string())
        } else {
            AppError::from(e)
        }
    })?;

    let attempt = fetch_attempt(&mut tx, attempt_id).await?;
    tx.commit().await?;

    tracing::info!(
        "Student {} started quiz attempt {} on item {}",
        caller.id,
        attempt_id,
        learning_item_id
    );
    Ok(attempt.into())
}

/// Grades and records a batch of answers. The batch is all-or-nothing:
/// any rejected answer rolls back the ones before it.
pub async fn submit_all_answers(
    pool: &SqlitePool,
    caller: &CurrentUser,
    attempt_id: i64,
    answers: &[AnswerSubmission],
) -> Result<Vec<StudentResponseDto>, AppError> {
    if answers.is_empty() {
        return Err(AppError::BadRequest("No answers submitted".to_string()));
    }

    let mut tx = begin_write(pool).await?;

    let attempt = fetch_attempt(&mut tx, attempt_id).await?;
    ensure_owner(&attempt, caller)?;
    if !attempt.is_open() {
        return Err(AppError::BadRequest(ATTEMPT_COMPLETED.to_string()));
    }

    let mut answered: HashSet<i64> = fetch_responses(&mut tx, attempt_id)
        .await?
        .into_iter()
        .map(|r| r.question_id)
        .collect();

    let mut inserted = Vec::with_capacity(answers.len());
    for answer in answers {
        let question_id = answer.question_id;

        if !answered.insert(question_id) {
            return Err(AppError::BadRequest(format!(
                "Question {question_id} already answered"
            )));
        }

        let question: Question = question::find_question(&mut tx, question_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Question not found: {question_id}")))?;

        if question.quiz_bank_id != attempt.quiz_bank_id {
            return Err(AppError::BadRequest(format!(
                "Question {question_id} does not belong to this quiz"
            )));
        }

        let (is_correct, points_earned) = grade(&answer.selected_answer, &question.correct_answer);

        let response_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO student_responses
                (quiz_attempt_id, question_id, selected_answer, is_correct, points_earned)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(attempt_id)
        .bind(question_id)
        .bind(&answer.selected_answer)
        .bind(is_correct)
        .bind(points_earned)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::BadRequest(format!("Question {question_id} already answered"))
            } else {
                AppError::from(e)
            }
        })?;

        inserted.push(response_id);
    }

    let responses: Vec<StudentResponseDto> = fetch_responses(&mut tx, attempt_id)
        .await?
        .into_iter()
        .filter(|r| inserted.contains(&r.id))
        .map(|r| StudentResponseDto::new(r, false))
        .collect();

    tx.commit().await?;

    tracing::info!(
        "Recorded {} answers on quiz attempt {}",
        responses.len(),
        attempt_id
    );
    Ok(responses)
}

/// Closes the attempt: total = points earned, max = questions answered.
pub async fn complete_attempt(
    pool: &SqlitePool,
    caller: &CurrentUser,
    attempt_id: i64,
) -> Result<QuizResultDto, AppError> {
    let mut tx = begin_write(pool).await?;

    let attempt = fetch_attempt(&mut tx, attempt_id).await?;
    ensure_owner(&attempt, caller)?;
    if !attempt.is_open() {
        return Err(AppError::BadRequest(ATTEMPT_COMPLETED.to_string()));
    }

    let responses = fetch_responses(&mut tx, attempt_id).await?;
    let (total_score, max_possible_score) = score(&responses);

    // Guarded on status so a concurrent completion cannot apply twice.
    let updated = sqlx::query(
        r#"
        UPDATE quiz_attempts
        SET end_time = ?, total_score = ?, max_possible_score = ?, status = ?
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(Utc::now())
    .bind(total_score)
    .bind(max_possible_score)
    .bind(QuizAttemptStatus::Completed.as_str())
    .bind(attempt_id)
    .bind(QuizAttemptStatus::InProgress.as_str())
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(AppError::BadRequest(ATTEMPT_COMPLETED.to_string()));
    }

    let completed = fetch_attempt(&mut tx, attempt_id).await?;
    tx.commit().await?;

    tracing::info!(
        "Quiz attempt {} completed: {}/{}",
        attempt_id,
        total_score,
        max_possible_score
    );
    Ok(QuizResultDto::new(completed, responses))
}

pub async fn get_results(
    pool: &SqlitePool,
    caller: &CurrentUser,
    attempt_id: i64,
) -> Result<QuizResultDto, AppError> {
    let mut conn = pool.acquire().await?;
    let attempt = fetch_attempt(&mut conn, attempt_id).await?;
    ensure_reader(attempt.student_id, caller)?;
    let responses = fetch_responses(&mut conn, attempt_id).await?;
    Ok(QuizResultDto::new(attempt, responses))
}

pub async fn get_attempt(
    pool: &SqlitePool,
    caller: &CurrentUser,
    attempt_id: i64,
) -> Result<QuizAttemptDto, AppError> {
    let mut conn = pool.acquire().await?;
    let attempt = fetch_attempt(&mut conn, attempt_id).await?;
    ensure_reader(attempt.student_id, caller)?;
    Ok(attempt.into())
}

/// The attempt with its bank's questions, correct answers stripped.
pub async fn get_attempt_with_questions(
    pool: &SqlitePool,
    caller: &CurrentUser,
    attempt_id: i64,
) -> Result<QuizAttemptWithQuestionsDto, AppError> {
    let mut conn = pool.acquire().await?;
    let attempt = fetch_attempt(&mut conn, attempt_id).await?;
    ensure_owner(&attempt, caller)?;

    let questions = question::questions_of_bank(&mut conn, attempt.quiz_bank_id)
        .await?
        .into_iter()
        .map(PublicQuestionDto::from)
        .collect();
    let answered_question_ids = fetch_responses(&mut conn, attempt_id)
        .await?
        .into_iter()
        .map(|r| r.question_id)
        .collect();

    Ok(QuizAttemptWithQuestionsDto {
        attempt: attempt.into(),
        questions,
        answered_question_ids,
    })
}

pub async fn attempts_by_student(
    pool: &SqlitePool,
    caller: &CurrentUser,
    student_id: i64,
) -> Result<Vec<QuizAttemptDto>, AppError> {
    ensure_reader(student_id, caller)?;
    let mut conn = pool.acquire().await?;

    if !user::exists(&mut conn, student_id).await? {
        return Err(AppError::NotFound("Student not found".to_string()));
    }

    let attempts = sqlx::query_as::<_, QuizAttempt>(&format!(
        "{SELECT_ATTEMPT} WHERE a.student_id = ? ORDER BY a.start_time DESC, a.id DESC"
    ))
    .bind(student_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(attempts.into_iter().map(QuizAttemptDto::from).collect())
}

/// Completed attempts of one student on one quiz item, most recent first.
pub async fn student_history(
    pool: &SqlitePool,
    caller: &CurrentUser,
    student_id: i64,
    learning_item_id: i64,
) -> Result<Vec<QuizResultDto>, AppError> {
    ensure_reader(student_id, caller)?;
    let mut conn = pool.acquire().await?;

    if !user::exists(&mut conn, student_id).await? {
        return Err(AppError::NotFound("Student not found".to_string()));
    }
    if learning_item::find_item(&mut conn, learning_item_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound("Learning item not found".to_string()));
    }

    let attempts = sqlx::query_as::<_, QuizAttempt>(&format!(
        r#"{SELECT_ATTEMPT}
        WHERE a.student_id = ? AND a.learning_item_id = ? AND a.status = ?
        ORDER BY a.start_time DESC, a.id DESC"#
    ))
    .bind(student_id)
    .bind(learning_item_id)
    .bind(QuizAttemptStatus::Completed.as_str())
    .fetch_all(&mut *conn)
    .await?;

    let mut history = Vec::with_capacity(attempts.len());
    for attempt in attempts {
        let responses = fetch_responses(&mut conn, attempt.id).await?;
        history.push(QuizResultDto::new(attempt, responses));
    }
    Ok(history)
}

/// Removes attempts (and their responses) of the given learning items.
/// Callers run it inside the transaction that deletes the items.
pub(crate) async fn delete_for_items(
    conn: &mut SqliteConnection,
    learning_item_ids: &[i64],
) -> Result<(), AppError> {
    for item_id in learning_item_ids {
        sqlx::query(
            r#"
            DELETE FROM student_responses
            WHERE quiz_attempt_id IN (SELECT id FROM quiz_attempts WHERE learning_item_id = ?)
            "#,
        )
        .bind(item_id)
        .execute(&mut *conn)
        .await?;

        sqlx::query("DELETE FROM quiz_attempts WHERE learning_item_id = ?")
            .bind(item_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}
