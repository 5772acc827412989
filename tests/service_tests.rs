// tests/service_tests.rs

mod common;

use async_trait::async_trait;
use chrono::Utc;
use common::{Account, count, spawn_app};
use lms_backend::{
    error::{AppError, is_unique_violation},
    models::{
        document::{DocumentUploadForm, UploadedFile},
        enums::UserRole,
        quiz_attempt::AnswerSubmission,
    },
    services::{document, quiz_attempt, storage::FileStorage},
    utils::jwt::CurrentUser,
};
use tokio::task::JoinSet;

fn as_caller(account: &Account, role: UserRole) -> CurrentUser {
    CurrentUser {
        id: account.id,
        username: account.username.clone(),
        role,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_starts_open_exactly_one_attempt() {
    let app = spawn_app().await;
    let teacher = app.teacher().await;
    let student = as_caller(&app.student().await, UserRole::Student);
    let quiz = app.quiz_fixture(&teacher).await;

    let mut tasks = JoinSet::new();
    for _ in 0..8 {
        let pool = app.pool.clone();
        let student = student.clone();
        let item_id = quiz.item_id;
        tasks.spawn(async move { quiz_attempt::start_attempt(&pool, &student, item_id).await });
    }

    let mut started = 0;
    while let Some(outcome) = tasks.join_next().await {
        match outcome.unwrap() {
            Ok(_) => started += 1,
            Err(AppError::BadRequest(msg)) => {
                assert_eq!(msg, "There is already an in-progress quiz attempt")
            }
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(started, 1);
    assert_eq!(
        count(
            &app.pool,
            "SELECT COUNT(*) FROM quiz_attempts WHERE student_id = ?",
            student.id
        )
        .await,
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_identical_answers_are_recorded_once() {
    let app = spawn_app().await;
    let teacher = app.teacher().await;
    let student = as_caller(&app.student().await, UserRole::Student);
    let quiz = app.quiz_fixture(&teacher).await;
    let attempt = quiz_attempt::start_attempt(&app.pool, &student, quiz.item_id)
        .await
        .unwrap();

    let answer = AnswerSubmission {
        question_id: quiz.question_ids[0],
        selected_answer: "A".to_string(),
    };

    let mut tasks = JoinSet::new();
    for _ in 0..10 {
        let pool = app.pool.clone();
        let student = student.clone();
        let answers = vec![answer.clone()];
        let attempt_id = attempt.id;
        tasks.spawn(async move {
            quiz_attempt::submit_all_answers(&pool, &student, attempt_id, &answers).await
        });
    }

    let mut recorded = 0;
    while let Some(outcome) = tasks.join_next().await {
        match outcome.unwrap() {
            Ok(responses) => {
                assert_eq!(responses.len(), 1);
                recorded += 1;
            }
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("already answered"), "{msg}"),
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(recorded, 1);
    assert_eq!(
        count(
            &app.pool,
            "SELECT COUNT(*) FROM student_responses WHERE quiz_attempt_id = ?",
            attempt.id
        )
        .await,
        1
    );
}

#[tokio::test]
async fn unique_indexes_reject_duplicate_rows() {
    let app = spawn_app().await;
    let teacher = app.teacher().await;
    let student = app.student().await;
    let quiz = app.quiz_fixture(&teacher).await;

    let insert_attempt = || {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO quiz_attempts (student_id, quiz_bank_id, learning_item_id, start_time, status)
            VALUES (?, ?, ?, ?, 'IN_PROGRESS')
            RETURNING id
            "#,
        )
        .bind(student.id)
        .bind(quiz.bank_id)
        .bind(quiz.item_id)
        .bind(Utc::now())
        .fetch_one(&app.pool)
    };

    let attempt_id = insert_attempt().await.unwrap();
    let err = insert_attempt().await.unwrap_err();
    assert!(is_unique_violation(&err));

    // A completed attempt no longer blocks a new one.
    sqlx::query("UPDATE quiz_attempts SET status = 'COMPLETED' WHERE id = ?")
        .bind(attempt_id)
        .execute(&app.pool)
        .await
        .unwrap();
    insert_attempt().await.unwrap();

    let insert_response = || {
        sqlx::query(
            r#"
            INSERT INTO student_responses
                (quiz_attempt_id, question_id, selected_answer, is_correct, points_earned)
            VALUES (?, ?, 'A', 1, 1)
            "#,
        )
        .bind(attempt_id)
        .bind(quiz.question_ids[0])
        .execute(&app.pool)
    };

    insert_response().await.unwrap();
    let err = insert_response().await.unwrap_err();
    assert!(is_unique_violation(&err));
}

/// Keeps nothing and cannot delete.
struct StuckStorage;

#[async_trait]
impl FileStorage for StuckStorage {
    async fn store(
        &self,
        directory: &str,
        original_name: &str,
        _content_type: &str,
        _bytes: Vec<u8>,
    ) -> Result<String, AppError> {
        Ok(format!("/files/{directory}/{original_name}"))
    }

    async fn delete(&self, _file_url: &str) -> Result<bool, AppError> {
        Err(AppError::InternalServerError("storage offline".to_string()))
    }
}

#[tokio::test]
async fn document_row_is_removed_even_when_the_file_is_not() {
    let app = spawn_app().await;
    let teacher = as_caller(&app.teacher().await, UserRole::Teacher);

    let form = DocumentUploadForm {
        title: "Syllabus".to_string(),
        ..DocumentUploadForm::default()
    };
    let file = UploadedFile {
        file_name: "syllabus.pdf".to_string(),
        content_type: Some("application/pdf".to_string()),
        bytes: b"%PDF".to_vec(),
    };
    let created =
        document::upload_document(&app.pool, &StuckStorage, &app.config, &teacher, form, file)
            .await
            .unwrap();
    assert_eq!(created.file_url, "/files/documents/syllabus.pdf");

    document::delete_document(&app.pool, &StuckStorage, &teacher, created.id)
        .await
        .unwrap();
    assert_eq!(
        count(&app.pool, "SELECT COUNT(*) FROM documents WHERE id = ?", created.id).await,
        0
    );
}
