// tests/quiz_flow_tests.rs

mod common;

use common::{body, data_id, spawn_app};
use serde_json::json;

async fn start(app: &common::TestApp, token: &str, item_id: i64) -> reqwest::Response {
    app.post("/api/quizzes/attempt", token, &json!({ "learningItemId": item_id }))
        .await
}

#[tokio::test]
async fn completed_attempt_scores_correct_answers_over_answered_questions() {
    let app = spawn_app().await;
    let teacher = app.teacher().await;
    let student = app.student().await;
    let quiz = app.quiz_fixture(&teacher).await;
    let q = &quiz.question_ids;

    let res = start(&app, &student.token, quiz.item_id).await;
    assert_eq!(res.status().as_u16(), 201);
    let attempt = body(res).await;
    assert_eq!(attempt["message"], "Quiz attempt started successfully");
    assert_eq!(attempt["data"]["status"], "IN_PROGRESS");
    assert!(attempt["data"]["totalScore"].is_null());
    let attempt_id = attempt["data"]["id"].as_i64().unwrap();

    let res = app
        .put(
            &format!("/api/quizzes/attempt/{attempt_id}/answers"),
            &student.token,
            &json!([
                { "questionId": q[0], "selectedAnswer": "A" },
                { "questionId": q[1], "selectedAnswer": "X" },
                { "questionId": q[2], "selectedAnswer": "C" }
            ]),
        )
        .await;
    assert_eq!(res.status().as_u16(), 200);
    let graded = body(res).await;
    let graded = graded["data"].as_array().unwrap();
    assert_eq!(graded.len(), 3);
    assert_eq!(graded[0]["isCorrect"], true);
    assert_eq!(graded[1]["isCorrect"], false);
    assert_eq!(graded[1]["pointsEarned"], 0);
    assert_eq!(graded[2]["pointsEarned"], 1);
    // The answer key stays hidden while the attempt is open.
    assert!(graded.iter().all(|r| r.get("correctAnswer").is_none()));

    let res = app
        .get(&format!("/api/quizzes/attempt/{attempt_id}/results"), &student.token)
        .await;
    let open = body(res).await;
    assert!(open["data"]["responses"]
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r.get("correctAnswer").is_none()));

    let res = app
        .put(
            &format!("/api/quizzes/attempt/{attempt_id}/complete"),
            &student.token,
            &json!({}),
        )
        .await;
    assert_eq!(res.status().as_u16(), 200);
    let result = body(res).await;
    assert_eq!(result["data"]["status"], "COMPLETED");
    assert_eq!(result["data"]["totalScore"], 2);
    assert_eq!(result["data"]["maxPossibleScore"], 3);
    let pct = result["data"]["percentageScore"].as_f64().unwrap();
    assert!((pct - 66.67).abs() < 0.01);
    assert!(!result["data"]["endTime"].is_null());

    // Results are read back from the stored totals.
    let res = app
        .get(&format!("/api/quizzes/attempt/{attempt_id}/results"), &student.token)
        .await;
    assert_eq!(res.status().as_u16(), 200);
    let stored = body(res).await;
    assert_eq!(stored["data"]["totalScore"], 2);
    let responses = stored["data"]["responses"].as_array().unwrap();
    assert_eq!(responses.len(), 3);
    assert_eq!(responses[1]["selectedAnswer"], "X");
    assert_eq!(responses[1]["correctAnswer"], "B");
}

#[tokio::test]
async fn max_possible_score_counts_only_answered_questions() {
    let app = spawn_app().await;
    let teacher = app.teacher().await;
    let student = app.student().await;
    let quiz = app.quiz_fixture(&teacher).await;

    let attempt_id = data_id(start(&app, &student.token, quiz.item_id).await).await;
    app.put(
        &format!("/api/quizzes/attempt/{attempt_id}/answers"),
        &student.token,
        &json!([{ "questionId": quiz.question_ids[1], "selectedAnswer": "B" }]),
    )
    .await;

    let res = app
        .put(
            &format!("/api/quizzes/attempt/{attempt_id}/complete"),
            &student.token,
            &json!({}),
        )
        .await;
    let result = body(res).await;
    assert_eq!(result["data"]["totalScore"], 1);
    assert_eq!(result["data"]["maxPossibleScore"], 1);
    assert_eq!(result["data"]["percentageScore"].as_f64().unwrap(), 100.0);
}

#[tokio::test]
async fn empty_attempt_completes_with_zero_percentage() {
    let app = spawn_app().await;
    let teacher = app.teacher().await;
    let student = app.student().await;
    let quiz = app.quiz_fixture(&teacher).await;

    let attempt_id = data_id(start(&app, &student.token, quiz.item_id).await).await;
    let res = app
        .put(
            &format!("/api/quizzes/attempt/{attempt_id}/complete"),
            &student.token,
            &json!({}),
        )
        .await;
    assert_eq!(res.status().as_u16(), 200);
    let result = body(res).await;
    assert_eq!(result["data"]["maxPossibleScore"], 0);
    assert_eq!(result["data"]["percentageScore"].as_f64().unwrap(), 0.0);
}

#[tokio::test]
async fn second_start_is_rejected_while_first_is_in_progress() {
    let app = spawn_app().await;
    let teacher = app.teacher().await;
    let student = app.student().await;
    let quiz = app.quiz_fixture(&teacher).await;

    let first = data_id(start(&app, &student.token, quiz.item_id).await).await;

    let res = start(&app, &student.token, quiz.item_id).await;
    assert_eq!(res.status().as_u16(), 400);
    let err = body(res).await;
    assert_eq!(err["status"], "ERROR");
    assert_eq!(err["message"], "There is already an in-progress quiz attempt");

    // Another student is not affected.
    let other = app.student().await;
    assert_eq!(start(&app, &other.token, quiz.item_id).await.status().as_u16(), 201);

    // Once completed, the student may try again.
    app.put(
        &format!("/api/quizzes/attempt/{first}/complete"),
        &student.token,
        &json!({}),
    )
    .await;
    assert_eq!(start(&app, &student.token, quiz.item_id).await.status().as_u16(), 201);
}

#[tokio::test]
async fn answering_a_question_twice_is_rejected() {
    let app = spawn_app().await;
    let teacher = app.teacher().await;
    let student = app.student().await;
    let quiz = app.quiz_fixture(&teacher).await;
    let q = &quiz.question_ids;

    let attempt_id = data_id(start(&app, &student.token, quiz.item_id).await).await;
    let path = format!("/api/quizzes/attempt/{attempt_id}/answers");

    let res = app
        .put(&path, &student.token, &json!([{ "questionId": q[0], "selectedAnswer": "A" }]))
        .await;
    assert_eq!(res.status().as_u16(), 200);

    let res = app
        .put(&path, &student.token, &json!([{ "questionId": q[0], "selectedAnswer": "B" }]))
        .await;
    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(body(res).await["message"], format!("Question {} already answered", q[0]));

    // A batch that repeats a question is rejected as a whole.
    let res = app
        .put(
            &path,
            &student.token,
            &json!([
                { "questionId": q[1], "selectedAnswer": "B" },
                { "questionId": q[1], "selectedAnswer": "C" }
            ]),
        )
        .await;
    assert_eq!(res.status().as_u16(), 400);

    let stored = common::count(
        &app.pool,
        "SELECT COUNT(*) FROM student_responses WHERE quiz_attempt_id = ?",
        attempt_id,
    )
    .await;
    assert_eq!(stored, 1);
}

#[tokio::test]
async fn completed_attempt_is_immutable() {
    let app = spawn_app().await;
    let teacher = app.teacher().await;
    let student = app.student().await;
    let quiz = app.quiz_fixture(&teacher).await;

    let attempt_id = data_id(start(&app, &student.token, quiz.item_id).await).await;
    let complete = format!("/api/quizzes/attempt/{attempt_id}/complete");

    assert_eq!(app.put(&complete, &student.token, &json!({})).await.status().as_u16(), 200);

    let res = app.put(&complete, &student.token, &json!({})).await;
    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(body(res).await["message"], "This quiz attempt is already completed");

    let res = app
        .put(
            &format!("/api/quizzes/attempt/{attempt_id}/answers"),
            &student.token,
            &json!([{ "questionId": quiz.question_ids[0], "selectedAnswer": "A" }]),
        )
        .await;
    assert_eq!(res.status().as_u16(), 400);
}

#[tokio::test]
async fn invalid_answers_are_rejected() {
    let app = spawn_app().await;
    let teacher = app.teacher().await;
    let student = app.student().await;
    let quiz = app.quiz_fixture(&teacher).await;

    // A question from another bank.
    let res = app
        .post("/api/quiz-banks", &teacher.token, &json!({ "title": "Other" }))
        .await;
    let other_bank = data_id(res).await;
    let res = app
        .post(
            "/api/questions",
            &teacher.token,
            &json!({
                "quizBankId": other_bank,
                "questionText": "Elsewhere?",
                "questionType": "TRUE_FALSE",
                "options": ["true", "false"],
                "correctAnswer": "true"
            }),
        )
        .await;
    let foreign_question = data_id(res).await;

    let attempt_id = data_id(start(&app, &student.token, quiz.item_id).await).await;
    let path = format!("/api/quizzes/attempt/{attempt_id}/answers");

    let res = app
        .put(&path, &student.token, &json!([{ "questionId": foreign_question, "selectedAnswer": "true" }]))
        .await;
    assert_eq!(res.status().as_u16(), 400);

    let res = app
        .put(&path, &student.token, &json!([{ "questionId": 999_999, "selectedAnswer": "A" }]))
        .await;
    assert_eq!(res.status().as_u16(), 404);

    let res = app.put(&path, &student.token, &json!([])).await;
    assert_eq!(res.status().as_u16(), 400);

    let res = app
        .put(
            "/api/quizzes/attempt/999999/answers",
            &student.token,
            &json!([{ "questionId": quiz.question_ids[0], "selectedAnswer": "A" }]),
        )
        .await;
    assert_eq!(res.status().as_u16(), 404);
}

#[tokio::test]
async fn start_requires_a_quiz_item_with_a_bank() {
    let app = spawn_app().await;
    let teacher = app.teacher().await;
    let student = app.student().await;
    let quiz = app.quiz_fixture(&teacher).await;

    let res = app
        .post(
            "/learning-items",
            &teacher.token,
            &json!({ "weekId": quiz.week_id, "title": "Intro video", "type": "VIDEO" }),
        )
        .await;
    let video_id = data_id(res).await;
    let res = start(&app, &student.token, video_id).await;
    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(body(res).await["message"], "Learning item is not a quiz");

    let res = app
        .post(
            "/learning-items",
            &teacher.token,
            &json!({ "weekId": quiz.week_id, "title": "Unlinked quiz", "type": "QUIZ" }),
        )
        .await;
    let unlinked_id = data_id(res).await;
    let res = start(&app, &student.token, unlinked_id).await;
    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(
        body(res).await["message"],
        "No quiz bank associated with this learning item"
    );

    let res = start(&app, &student.token, 999_999).await;
    assert_eq!(res.status().as_u16(), 404);
}

#[tokio::test]
async fn other_students_cannot_touch_an_attempt() {
    let app = spawn_app().await;
    let teacher = app.teacher().await;
    let owner = app.student().await;
    let intruder = app.student().await;
    let quiz = app.quiz_fixture(&teacher).await;

    let attempt_id = data_id(start(&app, &owner.token, quiz.item_id).await).await;

    let res = app
        .put(
            &format!("/api/quizzes/attempt/{attempt_id}/answers"),
            &intruder.token,
            &json!([{ "questionId": quiz.question_ids[0], "selectedAnswer": "A" }]),
        )
        .await;
    assert_eq!(res.status().as_u16(), 403);

    let res = app
        .get(&format!("/api/quizzes/attempt/{attempt_id}"), &intruder.token)
        .await;
    assert_eq!(res.status().as_u16(), 403);

    // Teachers may read it.
    let res = app
        .get(&format!("/api/quizzes/attempt/{attempt_id}"), &teacher.token)
        .await;
    assert_eq!(res.status().as_u16(), 200);
}

#[tokio::test]
async fn attempt_questions_hide_correct_answers() {
    let app = spawn_app().await;
    let teacher = app.teacher().await;
    let student = app.student().await;
    let quiz = app.quiz_fixture(&teacher).await;

    let attempt_id = data_id(start(&app, &student.token, quiz.item_id).await).await;
    app.put(
        &format!("/api/quizzes/attempt/{attempt_id}/answers"),
        &student.token,
        &json!([{ "questionId": quiz.question_ids[0], "selectedAnswer": "A" }]),
    )
    .await;

    let res = app
        .get(&format!("/api/quizzes/attempt/{attempt_id}/questions"), &student.token)
        .await;
    assert_eq!(res.status().as_u16(), 200);
    let data = body(res).await["data"].clone();
    let questions = data["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 3);
    assert!(questions.iter().all(|q| q.get("correctAnswer").is_none()));
    assert_eq!(data["answeredQuestionIds"], json!([quiz.question_ids[0]]));
}

#[tokio::test]
async fn history_lists_completed_attempts_newest_first() {
    let app = spawn_app().await;
    let teacher = app.teacher().await;
    let student = app.student().await;
    let quiz = app.quiz_fixture(&teacher).await;

    let mut ids = Vec::new();
    for answer in ["A", "X"] {
        let attempt_id = data_id(start(&app, &student.token, quiz.item_id).await).await;
        app.put(
            &format!("/api/quizzes/attempt/{attempt_id}/answers"),
            &student.token,
            &json!([{ "questionId": quiz.question_ids[0], "selectedAnswer": answer }]),
        )
        .await;
        app.put(
            &format!("/api/quizzes/attempt/{attempt_id}/complete"),
            &student.token,
            &json!({}),
        )
        .await;
        ids.push(attempt_id);
    }
    // An open attempt is left out of the history.
    start(&app, &student.token, quiz.item_id).await;

    let res = app
        .get(
            &format!(
                "/api/quizzes/student/{}/history?learningItemId={}",
                student.id, quiz.item_id
            ),
            &student.token,
        )
        .await;
    assert_eq!(res.status().as_u16(), 200);
    let history = body(res).await["data"].clone();
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["attemptId"], ids[1]);
    assert_eq!(history[0]["totalScore"], 0);
    assert_eq!(history[1]["totalScore"], 1);

    let res = app
        .get(&format!("/api/quizzes/student/{}/attempts", student.id), &student.token)
        .await;
    assert_eq!(body(res).await["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn quiz_endpoints_require_a_token() {
    let app = spawn_app().await;
    let res = app
        .client
        .post(app.url("/api/quizzes/attempt"))
        .json(&json!({ "learningItemId": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 401);
}

#[tokio::test]
async fn malformed_requests_get_the_error_envelope() {
    let app = spawn_app().await;
    let teacher = app.teacher().await;
    let student = app.student().await;
    let quiz = app.quiz_fixture(&teacher).await;

    let res = app.post("/api/quizzes/attempt", &student.token, &json!({})).await;
    assert_eq!(res.status().as_u16(), 400);
    let err = body(res).await;
    assert_eq!(err["status"], "ERROR");
    assert!(err["message"].as_str().unwrap().contains("learningItemId"));
    assert!(err["data"].is_null());

    let attempt_id = data_id(start(&app, &student.token, quiz.item_id).await).await;
    let res = app
        .put(
            &format!("/api/quizzes/attempt/{attempt_id}/answers"),
            &student.token,
            &json!([{ "questionId": quiz.question_ids[0] }]),
        )
        .await;
    assert_eq!(res.status().as_u16(), 400);
    let err = body(res).await;
    assert_eq!(err["status"], "ERROR");
    assert!(err["message"].as_str().unwrap().contains("selectedAnswer"));

    let res = app.get("/api/quizzes/attempt/abc", &student.token).await;
    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(body(res).await["status"], "ERROR");

    let res = app
        .get(
            &format!("/api/quizzes/student/{}/history?learningItemId=x", student.id),
            &student.token,
        )
        .await;
    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(body(res).await["status"], "ERROR");
}
