// tests/quiz_bank_tests.rs

mod common;

use common::{body, data_id, spawn_app};
use serde_json::json;

#[tokio::test]
async fn banks_report_question_counts_and_soft_delete() {
    let app = spawn_app().await;
    let teacher = app.teacher().await;
    let quiz = app.quiz_fixture(&teacher).await;

    let res = app.get(&format!("/api/quiz-banks/{}", quiz.bank_id), &teacher.token).await;
    let bank = body(res).await["data"].clone();
    assert_eq!(bank["questionCount"], 3);
    assert_eq!(bank["active"], true);
    assert_eq!(bank["createdById"], teacher.id);

    let res = app.delete(&format!("/api/quiz-banks/{}", quiz.bank_id), &teacher.token).await;
    assert_eq!(res.status().as_u16(), 200);

    // Still readable, no longer listed.
    let res = app.get(&format!("/api/quiz-banks/{}", quiz.bank_id), &teacher.token).await;
    assert_eq!(body(res).await["data"]["active"], false);
    let res = app.get("/api/quiz-banks", &teacher.token).await;
    assert_eq!(body(res).await["data"].as_array().unwrap().len(), 0);
    let res = app
        .get(&format!("/api/quiz-banks/teacher/{}", teacher.id), &teacher.token)
        .await;
    assert_eq!(body(res).await["data"].as_array().unwrap().len(), 0);

    let res = app.get("/api/quiz-banks/teacher/999999", &teacher.token).await;
    assert_eq!(res.status().as_u16(), 404);
}

#[tokio::test]
async fn update_only_touches_changed_fields() {
    let app = spawn_app().await;
    let teacher = app.teacher().await;
    let res = app
        .post(
            "/api/quiz-banks",
            &teacher.token,
            &json!({ "title": "Original", "description": "desc" }),
        )
        .await;
    let created = body(res).await["data"].clone();
    let id = created["id"].as_i64().unwrap();

    // Blank title and identical description are no-ops.
    let res = app
        .put(
            &format!("/api/quiz-banks/{id}"),
            &teacher.token,
            &json!({ "title": "  ", "description": "desc" }),
        )
        .await;
    let unchanged = body(res).await["data"].clone();
    assert_eq!(unchanged["title"], "Original");
    assert_eq!(unchanged["lastModifiedDate"], created["lastModifiedDate"]);

    let res = app
        .put(&format!("/api/quiz-banks/{id}"), &teacher.token, &json!({ "title": "Renamed" }))
        .await;
    let renamed = body(res).await["data"].clone();
    assert_eq!(renamed["title"], "Renamed");
    assert_eq!(renamed["description"], "desc");
    assert_ne!(renamed["lastModifiedDate"], created["lastModifiedDate"]);
}

#[tokio::test]
async fn association_requires_an_active_bank_and_a_quiz_item() {
    let app = spawn_app().await;
    let teacher = app.teacher().await;
    let quiz = app.quiz_fixture(&teacher).await;

    let res = app
        .post(
            "/learning-items",
            &teacher.token,
            &json!({ "weekId": quiz.week_id, "title": "Video", "type": "VIDEO" }),
        )
        .await;
    let video_id = data_id(res).await;
    let res = app
        .post(
            "/learning-items",
            &teacher.token,
            &json!({ "weekId": quiz.week_id, "title": "Quiz 2", "type": "QUIZ" }),
        )
        .await;
    let quiz2_id = data_id(res).await;

    let path = format!("/api/quiz-banks/{}/learning-items", quiz.bank_id);
    let res = app.put(&path, &teacher.token, &json!({ "learningItemId": video_id })).await;
    assert_eq!(res.status().as_u16(), 400);

    let res = app.put(&path, &teacher.token, &json!({ "learningItemId": 999_999 })).await;
    assert_eq!(res.status().as_u16(), 404);

    let res = app.put(&path, &teacher.token, &json!({ "learningItemId": quiz2_id })).await;
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(body(res).await["data"]["quizBankId"], quiz.bank_id);

    app.delete(&format!("/api/quiz-banks/{}", quiz.bank_id), &teacher.token)
        .await;
    let res = app.put(&path, &teacher.token, &json!({ "learningItemId": quiz2_id })).await;
    assert_eq!(res.status().as_u16(), 400);
}

#[tokio::test]
async fn questions_are_for_authors_only() {
    let app = spawn_app().await;
    let teacher = app.teacher().await;
    let student = app.student().await;
    let quiz = app.quiz_fixture(&teacher).await;

    let res = app
        .get(&format!("/api/questions/{}", quiz.question_ids[0]), &student.token)
        .await;
    assert_eq!(res.status().as_u16(), 403);

    let res = app
        .get(&format!("/api/questions/{}", quiz.question_ids[0]), &teacher.token)
        .await;
    let question = body(res).await["data"].clone();
    assert_eq!(question["correctAnswer"], "A");
    assert_eq!(question["options"], json!(["A", "B", "C", "X"]));
}

#[tokio::test]
async fn question_validation_and_random_draws() {
    let app = spawn_app().await;
    let teacher = app.teacher().await;
    let quiz = app.quiz_fixture(&teacher).await;

    let res = app
        .post(
            "/api/questions",
            &teacher.token,
            &json!({
                "quizBankId": quiz.bank_id,
                "questionText": "   ",
                "questionType": "SHORT_ANSWER",
                "options": ["x"],
                "correctAnswer": "x"
            }),
        )
        .await;
    assert_eq!(res.status().as_u16(), 400);

    let res = app
        .post(
            "/api/questions",
            &teacher.token,
            &json!({
                "quizBankId": 999_999,
                "questionText": "Orphan?",
                "questionType": "SHORT_ANSWER",
                "options": ["x"],
                "correctAnswer": "x"
            }),
        )
        .await;
    assert_eq!(res.status().as_u16(), 404);

    let res = app
        .get(
            &format!("/api/questions/quiz-bank/{}/random?count=2", quiz.bank_id),
            &teacher.token,
        )
        .await;
    assert_eq!(body(res).await["data"].as_array().unwrap().len(), 2);

    let res = app
        .get(&format!("/api/questions/quiz-bank/{}/random", quiz.bank_id), &teacher.token)
        .await;
    assert_eq!(body(res).await["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn answered_questions_cannot_be_deleted() {
    let app = spawn_app().await;
    let teacher = app.teacher().await;
    let student = app.student().await;
    let quiz = app.quiz_fixture(&teacher).await;

    let res = app
        .post("/api/quizzes/attempt", &student.token, &json!({ "learningItemId": quiz.item_id }))
        .await;
    let attempt_id = data_id(res).await;
    app.put(
        &format!("/api/quizzes/attempt/{attempt_id}/answers"),
        &student.token,
        &json!([{ "questionId": quiz.question_ids[0], "selectedAnswer": "A" }]),
    )
    .await;

    let res = app
        .delete(&format!("/api/questions/{}", quiz.question_ids[0]), &teacher.token)
        .await;
    assert_eq!(res.status().as_u16(), 400);

    let res = app
        .delete(&format!("/api/questions/{}", quiz.question_ids[1]), &teacher.token)
        .await;
    assert_eq!(res.status().as_u16(), 200);
    let res = app
        .get(&format!("/api/questions/quiz-bank/{}", quiz.bank_id), &teacher.token)
        .await;
    assert_eq!(body(res).await["data"].as_array().unwrap().len(), 2);
}
