// tests/course_tests.rs

mod common;

use common::{body, count, data_id, spawn_app};
use serde_json::json;

#[tokio::test]
async fn deleting_a_course_leaves_no_orphans() {
    let app = spawn_app().await;
    let teacher = app.teacher().await;
    let student = app.student().await;
    let quiz = app.quiz_fixture(&teacher).await;

    // A second week with a plain item, an enrollment and a completed attempt.
    let week2 = app.create_week(&teacher, quiz.course_id, 2).await;
    app.post(
        "/learning-items",
        &teacher.token,
        &json!({ "weekId": week2, "title": "Reading", "type": "DOCUMENT" }),
    )
    .await;
    let res = app
        .post("/enrollments", &student.token, &json!({ "courseId": quiz.course_id }))
        .await;
    assert_eq!(res.status().as_u16(), 201);

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
        .delete(&format!("/courses/{}", quiz.course_id), &teacher.token)
        .await;
    assert_eq!(res.status().as_u16(), 200);

    let pool = &app.pool;
    let course = quiz.course_id;
    assert_eq!(count(pool, "SELECT COUNT(*) FROM courses WHERE id = ?", course).await, 0);
    assert_eq!(count(pool, "SELECT COUNT(*) FROM weeks WHERE course_id = ?", course).await, 0);
    assert_eq!(count(pool, "SELECT COUNT(*) FROM enrollments WHERE course_id = ?", course).await, 0);
    assert_eq!(count(pool, "SELECT COUNT(*) FROM learning_items WHERE week_id = ?", quiz.week_id).await, 0);
    assert_eq!(count(pool, "SELECT COUNT(*) FROM learning_items WHERE week_id = ?", week2).await, 0);
    assert_eq!(count(pool, "SELECT COUNT(*) FROM quiz_attempts WHERE id = ?", attempt_id).await, 0);
    assert_eq!(
        count(
            pool,
            "SELECT COUNT(*) FROM student_responses WHERE quiz_attempt_id = ?",
            attempt_id
        )
        .await,
        0
    );

    // Quiz banks are shared content and survive.
    assert_eq!(count(pool, "SELECT COUNT(*) FROM quiz_banks WHERE id = ?", quiz.bank_id).await, 1);

    let res = app.get_public(&format!("/courses/{course}")).await;
    assert_eq!(res.status().as_u16(), 404);
}

#[tokio::test]
async fn only_the_owner_or_an_admin_may_change_a_course() {
    let app = spawn_app().await;
    let owner = app.teacher().await;
    let other = app.teacher().await;
    let admin = app.admin().await;
    let course_id = app.create_course(&owner, "Owned").await;

    let update = json!({ "name": "Renamed", "isDraft": false });
    let res = app.put(&format!("/courses/{course_id}"), &other.token, &update).await;
    assert_eq!(res.status().as_u16(), 403);

    let res = app.delete(&format!("/courses/{course_id}"), &other.token).await;
    assert_eq!(res.status().as_u16(), 403);

    let res = app.put(&format!("/courses/{course_id}"), &admin.token, &update).await;
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(body(res).await["data"]["name"], "Renamed");
}

#[tokio::test]
async fn students_cannot_author_courses() {
    let app = spawn_app().await;
    let student = app.student().await;

    let res = app
        .post("/courses", &student.token, &json!({ "name": "Nope" }))
        .await;
    assert_eq!(res.status().as_u16(), 403);

    let res = app
        .client
        .post(app.url("/courses"))
        .json(&json!({ "name": "Nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 401);
}

#[tokio::test]
async fn published_listing_filters_and_pages() {
    let app = spawn_app().await;
    let teacher = app.teacher().await;

    for name in ["Algebra", "Biology", "Chemistry"] {
        app.create_course(&teacher, name).await;
    }
    let res = app
        .post("/courses", &teacher.token, &json!({ "name": "Draft Physics", "isDraft": true }))
        .await;
    assert_eq!(res.status().as_u16(), 201);

    let res = app.get_public("/courses?page=0&size=2").await;
    assert_eq!(res.status().as_u16(), 200);
    let page = body(res).await["data"].clone();
    assert_eq!(page["totalElements"], 3);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["last"], false);
    assert_eq!(page["content"][0]["name"], "Algebra");
    assert_eq!(page["content"][1]["name"], "Biology");

    let res = app.get_public("/courses?name=CHEM").await;
    let page = body(res).await["data"].clone();
    assert_eq!(page["totalElements"], 1);
    assert_eq!(page["content"][0]["name"], "Chemistry");

    let res = app.get_public(&format!("/courses?teacher={}", &teacher.username[..6]))
        .await;
    assert_eq!(body(res).await["data"]["totalElements"], 3);

    // Drafts only show up for their teacher.
    let res = app.get("/courses/teaching", &teacher.token).await;
    assert_eq!(body(res).await["data"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn course_detail_embeds_weeks_items_and_totals() {
    let app = spawn_app().await;
    let teacher = app.teacher().await;
    let course_id = app.create_course(&teacher, "Detailed").await;
    let week2 = app.create_week(&teacher, course_id, 2).await;
    let week1 = app.create_week(&teacher, course_id, 1).await;

    for (week, minutes) in [(week1, 10), (week1, 20), (week2, 5)] {
        let res = app
            .post(
                "/learning-items",
                &teacher.token,
                &json!({ "weekId": week, "title": "Lesson", "type": "VIDEO", "durationMinutes": minutes }),
            )
            .await;
        assert_eq!(res.status().as_u16(), 201);
    }

    let res = app.get_public(&format!("/courses/{course_id}")).await;
    assert_eq!(res.status().as_u16(), 200);
    let detail = body(res).await["data"].clone();
    assert_eq!(detail["numberOfLessons"], 3);
    assert_eq!(detail["totalDurationMinutes"], 35);
    assert_eq!(detail["weeks"][0]["weekNumber"], 1);
    assert_eq!(detail["weeks"][0]["learningItems"].as_array().unwrap().len(), 2);
    assert_eq!(detail["weeks"][1]["weekNumber"], 2);
}

#[tokio::test]
async fn week_numbers_are_unique_per_course() {
    let app = spawn_app().await;
    let teacher = app.teacher().await;
    let course_id = app.create_course(&teacher, "Weeks").await;
    app.create_week(&teacher, course_id, 1).await;
    let week2 = app.create_week(&teacher, course_id, 2).await;

    let res = app
        .post(
            "/weeks",
            &teacher.token,
            &json!({ "courseId": course_id, "title": "Again", "weekNumber": 1 }),
        )
        .await;
    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(
        body(res).await["message"],
        "A week with number 1 already exists in this course"
    );

    let res = app
        .put(
            &format!("/weeks/{week2}"),
            &teacher.token,
            &json!({ "title": "Moved", "weekNumber": 1 }),
        )
        .await;
    assert_eq!(res.status().as_u16(), 400);

    // Keeping its own number is fine.
    let res = app
        .put(
            &format!("/weeks/{week2}"),
            &teacher.token,
            &json!({ "title": "Renamed", "weekNumber": 2 }),
        )
        .await;
    assert_eq!(res.status().as_u16(), 200);

    // Another course may reuse the number.
    let other = app.create_course(&teacher, "Other").await;
    app.create_week(&teacher, other, 1).await;
}

#[tokio::test]
async fn items_append_and_reorder_within_a_week() {
    let app = spawn_app().await;
    let teacher = app.teacher().await;
    let course_id = app.create_course(&teacher, "Ordered").await;
    let week = app.create_week(&teacher, course_id, 1).await;
    let other_week = app.create_week(&teacher, course_id, 2).await;

    let mut ids = Vec::new();
    for title in ["first", "second", "third"] {
        let res = app
            .post(
                "/learning-items",
                &teacher.token,
                &json!({ "weekId": week, "title": title, "type": "EXERCISE" }),
            )
            .await;
        let item = body(res).await["data"].clone();
        assert_eq!(item["orderIndex"], ids.len() as i64);
        ids.push(item["id"].as_i64().unwrap());
    }

    let res = app
        .post(
            &format!("/learning-items/week/{week}/reorder"),
            &teacher.token,
            &json!([ids[2], ids[0], ids[1]]),
        )
        .await;
    assert_eq!(res.status().as_u16(), 200);
    let items = body(res).await["data"].clone();
    assert_eq!(items[0]["title"], "third");
    assert_eq!(items[0]["orderIndex"], 0);
    assert_eq!(items[2]["title"], "second");

    let res = app
        .post(
            &format!("/learning-items/week/{other_week}/reorder"),
            &teacher.token,
            &json!([ids[0]]),
        )
        .await;
    assert_eq!(res.status().as_u16(), 400);

    let res = app.get_public(&format!("/learning-items/week/{week}/type/EXERCISE"))
        .await;
    assert_eq!(body(res).await["data"].as_array().unwrap().len(), 3);
    let res = app.get_public(&format!("/learning-items/week/{week}/type/QUIZ")).await;
    assert_eq!(body(res).await["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn enrollment_rules() {
    let app = spawn_app().await;
    let teacher = app.teacher().await;
    let student = app.student().await;
    let course_id = app.create_course(&teacher, "Open").await;
    let res = app
        .post("/courses", &teacher.token, &json!({ "name": "Hidden", "isDraft": true }))
        .await;
    let draft_id = data_id(res).await;

    let res = app
        .post("/enrollments", &student.token, &json!({ "courseId": course_id }))
        .await;
    assert_eq!(res.status().as_u16(), 201);

    let res = app
        .post("/enrollments", &student.token, &json!({ "courseId": course_id }))
        .await;
    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(body(res).await["message"], "Student is already enrolled in this course.");

    let res = app
        .post("/enrollments", &student.token, &json!({ "courseId": draft_id }))
        .await;
    assert_eq!(res.status().as_u16(), 400);

    let res = app
        .post("/enrollments", &student.token, &json!({ "courseId": 999_999 }))
        .await;
    assert_eq!(res.status().as_u16(), 404);

    let res = app
        .post("/enrollments", &teacher.token, &json!({ "courseId": course_id }))
        .await;
    assert_eq!(res.status().as_u16(), 403);

    let res = app.get("/enrollments/my-courses", &student.token).await;
    let courses = body(res).await["data"].clone();
    assert_eq!(courses.as_array().unwrap().len(), 1);
    assert_eq!(courses[0]["id"], course_id);
}
