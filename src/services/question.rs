// src/services/question.rs

use sqlx::{SqliteConnection, SqlitePool, types::Json};

use crate::{
    config::{DEFAULT_RANDOM_QUESTION_COUNT, MAX_PAGE_SIZE},
    error::AppError,
    models::question::{Question, QuestionCreateRequest, QuestionDto, QuestionUpdateRequest},
    services::{begin_write, quiz_bank},
};

const SELECT_QUESTION: &str = r#"
    SELECT id, quiz_bank_id, question_text, question_type, options, correct_answer
    FROM questions
"#;

pub(crate) async fn find_question(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<Question>, AppError> {
    let question = sqlx::query_as::<_, Question>(&format!("{SELECT_QUESTION} WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(question)
}

async fn fetch_question(conn: &mut SqliteConnection, id: i64) -> Result<Question, AppError> {
    find_question(conn, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Question not found with id: {id}")))
}

pub(crate) async fn questions_of_bank(
    conn: &mut SqliteConnection,
    quiz_bank_id: i64,
) -> Result<Vec<Question>, AppError> {
    let questions = sqlx::query_as::<_, Question>(&format!(
        "{SELECT_QUESTION} WHERE quiz_bank_id = ? ORDER BY id"
    ))
    .bind(quiz_bank_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(questions)
}

async fn ensure_bank(conn: &mut SqliteConnection, quiz_bank_id: i64) -> Result<(), AppError> {
    if quiz_bank::find_bank(conn, quiz_bank_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Quiz bank not found with id: {quiz_bank_id}"
        )));
    }
    Ok(())
}

/// Rejects whitespace-only text, answers and options.
fn check_content(text: &str, options: &[String], correct_answer: &str) -> Result<(), AppError> {
    if text.trim().is_empty() {
        return Err(AppError::BadRequest("Question text is required".to_string()));
    }
    if options.is_empty() || options.iter().any(|o| o.trim().is_empty()) {
        return Err(AppError::BadRequest(
            "At least one non-empty option is required".to_string(),
        ));
    }
    if correct_answer.trim().is_empty() {
        return Err(AppError::BadRequest("Correct answer is required".to_string()));
    }
    Ok(())
}

pub async fn create_question(
    pool: &SqlitePool,
    req: QuestionCreateRequest,
) -> Result<QuestionDto, AppError> {
    check_content(&req.question_text, &req.options, &req.correct_answer)?;

    let mut tx = begin_write(pool).await?;
    ensure_bank(&mut tx, req.quiz_bank_id).await?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO questions (quiz_bank_id, question_text, question_type, options, correct_answer)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(req.quiz_bank_id)
    .bind(&req.question_text)
    .bind(req.question_type.as_str())
    .bind(Json(&req.options))
    .bind(&req.correct_answer)
    .fetch_one(&mut *tx)
    .await?;

    let question = fetch_question(&mut tx, id).await?;
    tx.commit().await?;

    tracing::info!("Question {} added to quiz bank {}", id, req.quiz_bank_id);
    Ok(question.into())
}

pub async fn get_question(pool: &SqlitePool, id: i64) -> Result<QuestionDto, AppError> {
    let mut conn = pool.acquire().await?;
    Ok(fetch_question(&mut conn, id).await?.into())
}

pub async fn questions_by_bank(
    pool: &SqlitePool,
    quiz_bank_id: i64,
) -> Result<Vec<QuestionDto>, AppError> {
    let mut conn = pool.acquire().await?;
    ensure_bank(&mut conn, quiz_bank_id).await?;
    let questions = questions_of_bank(&mut conn, quiz_bank_id).await?;
    Ok(questions.into_iter().map(QuestionDto::from).collect())
}

/// Up to `count` questions of the bank in random order.
pub async fn random_questions(
    pool: &SqlitePool,
    quiz_bank_id: i64,
    count: Option<i64>,
) -> Result<Vec<QuestionDto>, AppError> {
    let count = count
        .filter(|c| *c > 0)
        .unwrap_or(DEFAULT_RANDOM_QUESTION_COUNT)
        .min(MAX_PAGE_SIZE);

    let mut conn = pool.acquire().await?;
    ensure_bank(&mut conn, quiz_bank_id).await?;

    let questions = sqlx::query_as::<_, Question>(&format!(
        "{SELECT_QUESTION} WHERE quiz_bank_id = ? ORDER BY RANDOM() LIMIT ?"
    ))
    .bind(quiz_bank_id)
    .bind(count)
    .fetch_all(&mut *conn)
    .await?;
    Ok(questions.into_iter().map(QuestionDto::from).collect())
}

pub async fn update_question(
    pool: &SqlitePool,
    id: i64,
    req: QuestionUpdateRequest,
) -> Result<QuestionDto, AppError> {
    check_content(&req.question_text, &req.options, &req.correct_answer)?;

    let mut tx = begin_write(pool).await?;
    fetch_question(&mut tx, id).await?;

    sqlx::query(
        r#"
        UPDATE questions
        SET question_text = ?, question_type = ?, options = ?, correct_answer = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.question_text)
    .bind(req.question_type.as_str())
    .bind(Json(&req.options))
    .bind(&req.correct_answer)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    let question = fetch_question(&mut tx, id).await?;
    tx.commit().await?;
    Ok(question.into())
}

/// Questions that students already answered are kept for their results.
pub async fn delete_question(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let mut tx = begin_write(pool).await?;
    fetch_question(&mut tx, id).await?;

    let responses: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM student_responses WHERE question_id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
    if responses > 0 {
        return Err(AppError::BadRequest(
            "Question has recorded student responses and cannot be deleted".to_string(),
        ));
    }

    sqlx::query("DELETE FROM questions WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!("Question {} deleted", id);
    Ok(())
}
