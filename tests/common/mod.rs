// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::Arc;

use lms_backend::{
    config::Config,
    routes,
    services::{
        mail::{LogMailer, Mailer},
        storage::LocalFileStorage,
    },
    state::AppState,
};
use serde_json::{Value, json};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use tempfile::TempDir;
use uuid::Uuid;

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub client: reqwest::Client,
    pub config: Config,
    // Keeps the database file and uploads alive for the test's lifetime.
    _dir: TempDir,
}

/// Spawns the app on a random port over a fresh SQLite file.
pub async fn spawn_app() -> TestApp {
    spawn_app_with_mailer(Arc::new(LogMailer)).await
}

pub async fn spawn_app_with_mailer(mailer: Arc<dyn Mailer>) -> TestApp {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let database_url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());

    let config = Config {
        database_url,
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        upload_dir: dir.path().join("uploads"),
        max_upload_mb: 1,
        ..Config::default()
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(config.connect_options().expect("Invalid test database URL"))
        .await
        .expect("Failed to open SQLite database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let state = AppState {
        pool: pool.clone(),
        config: config.clone(),
        storage: Arc::new(LocalFileStorage::new(config.upload_dir.clone())),
        mailer,
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        pool,
        client: reqwest::Client::new(),
        config,
        _dir: dir,
    }
}

pub fn unique_username(prefix: &str) -> String {
    format!("{}_{}", prefix, &Uuid::new_v4().simple().to_string()[..8])
}

pub fn registration_body(username: &str) -> Value {
    json!({
        "name": username,
        "email": format!("{}@example.com", username),
        "username": username,
        "password": "password123",
        "fullName": format!("{} Tester", username),
        "gender": "OTHER",
        "birthYear": 1999,
        "phoneNumber": "+15550001111"
    })
}

/// A logged in account.
pub struct Account {
    pub id: i64,
    pub username: String,
    pub token: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn register(&self, kind: &str, username: &str) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/register/{kind}")))
            .json(&registration_body(username))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn login(&self, username: &str) -> String {
        let res = self
            .client
            .post(self.url("/login"))
            .json(&json!({ "username": username, "password": "password123" }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(res.status().as_u16(), 200);
        let body: Value = res.json().await.unwrap();
        body["data"]["token"].as_str().unwrap().to_string()
    }

    async fn account(&self, kind: &str, prefix: &str) -> Account {
        let username = unique_username(prefix);
        let res = self.register(kind, &username).await;
        assert_eq!(res.status().as_u16(), 201);

        let id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE username = ?")
            .bind(&username)
            .fetch_one(&self.pool)
            .await
            .unwrap();
        let token = self.login(&username).await;
        Account { id, username, token }
    }

    pub async fn student(&self) -> Account {
        self.account("student", "stu").await
    }

    pub async fn teacher(&self) -> Account {
        self.account("teacher", "tea").await
    }

    /// Registers a student and promotes it to ADMIN directly in the database.
    pub async fn admin(&self) -> Account {
        let account = self.account("student", "adm").await;
        sqlx::query("UPDATE users SET role = 'ADMIN' WHERE id = ?")
            .bind(account.id)
            .execute(&self.pool)
            .await
            .unwrap();
        let token = self.login(&account.username).await;
        Account { token, ..account }
    }

    pub async fn post(&self, path: &str, token: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn put(&self, path: &str, token: &str, body: &Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get_public(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Creates a published course and returns its id.
    pub async fn create_course(&self, teacher: &Account, name: &str) -> i64 {
        let res = self
            .post(
                "/courses",
                &teacher.token,
                &json!({ "name": name, "category": "Programming", "isDraft": false }),
            )
            .await;
        assert_eq!(res.status().as_u16(), 201);
        data_id(res).await
    }

    pub async fn create_week(&self, teacher: &Account, course_id: i64, number: i32) -> i64 {
        let res = self
            .post(
                "/weeks",
                &teacher.token,
                &json!({ "courseId": course_id, "title": format!("Week {number}"), "weekNumber": number }),
            )
            .await;
        assert_eq!(res.status().as_u16(), 201);
        data_id(res).await
    }

    /// Course → week → QUIZ item linked to a bank with questions answered A, B, C.
    pub async fn quiz_fixture(&self, teacher: &Account) -> QuizFixture {
        let course_id = self.create_course(teacher, "Quiz Course").await;
        let week_id = self.create_week(teacher, course_id, 1).await;

        let res = self
            .post("/api/quiz-banks", &teacher.token, &json!({ "title": "Basics" }))
            .await;
        assert_eq!(res.status().as_u16(), 201);
        let bank_id = data_id(res).await;

        let mut question_ids = Vec::new();
        for (i, answer) in ["A", "B", "C"].iter().enumerate() {
            let res = self
                .post(
                    "/api/questions",
                    &teacher.token,
                    &json!({
                        "quizBankId": bank_id,
                        "questionText": format!("Question {}", i + 1),
                        "questionType": "MULTIPLE_CHOICE",
                        "options": ["A", "B", "C", "X"],
                        "correctAnswer": answer
                    }),
                )
                .await;
            assert_eq!(res.status().as_u16(), 201);
            question_ids.push(data_id(res).await);
        }

        let res = self
            .post(
                "/learning-items",
                &teacher.token,
                &json!({
                    "weekId": week_id,
                    "title": "Checkpoint",
                    "type": "QUIZ",
                    "durationMinutes": 15,
                    "quizBankId": bank_id
                }),
            )
            .await;
        assert_eq!(res.status().as_u16(), 201);
        let item_id = data_id(res).await;

        QuizFixture {
            course_id,
            week_id,
            bank_id,
            item_id,
            question_ids,
        }
    }
}

pub struct QuizFixture {
    pub course_id: i64,
    pub week_id: i64,
    pub bank_id: i64,
    pub item_id: i64,
    pub question_ids: Vec<i64>,
}

pub async fn body(res: reqwest::Response) -> Value {
    res.json().await.expect("Response body is not JSON")
}

pub async fn data_id(res: reqwest::Response) -> i64 {
    body(res).await["data"]["id"].as_i64().expect("data.id missing")
}

pub async fn count(pool: &SqlitePool, sql: &str, id: i64) -> i64 {
    sqlx::query_scalar(sql).bind(id).fetch_one(pool).await.unwrap()
}
