// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{
        auth, courses, documents, enrollments, files, learning_items, questions, quiz_banks,
        quizzes, weeks,
    },
    state::AppState,
    utils::jwt::{auth_middleware, teacher_middleware},
};

/// Assembles the main application router.
///
/// * Reads of published content and `/files` are public.
/// * Everything else sits behind `auth_middleware`.
/// * Authoring writes additionally go through `teacher_middleware`.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let upload_limit = DefaultBodyLimit::max(
        usize::try_from(state.config.max_upload_bytes()).unwrap_or(usize::MAX),
    );

    // Layers apply bottom-up: auth runs before the role check.
    let authenticated = || middleware::from_fn_with_state(state.clone(), auth_middleware);
    let teacher_only = || middleware::from_fn(teacher_middleware);

    let auth_routes = Router::new()
        .route("/register/student", post(auth::register_student))
        .route("/register/teacher", post(auth::register_teacher))
        .route("/verify-email", get(auth::verify_email))
        .route("/login", post(auth::login));

    let course_routes = Router::new()
        .route("/", get(courses::list_courses))
        .route("/{id}", get(courses::get_course))
        .merge(
            Router::new()
                .route("/teaching", get(courses::teaching_courses))
                .route("/", post(courses::create_course))
                .route(
                    "/{id}",
                    put(courses::update_course).delete(courses::delete_course),
                )
                .layer(teacher_only())
                .layer(authenticated()),
        );

    let week_routes = Router::new()
        .route("/course/{course_id}", get(weeks::weeks_by_course))
        .route("/{id}", get(weeks::get_week))
        .merge(
            Router::new()
                .route("/", post(weeks::create_week))
                .route("/{id}", put(weeks::update_week).delete(weeks::delete_week))
                .layer(teacher_only())
                .layer(authenticated()),
        );

    let learning_item_routes = Router::new()
        .route("/{id}", get(learning_items::get_item))
        .route("/{id}/download", get(learning_items::download_item_document))
        .route("/week/{week_id}", get(learning_items::items_by_week))
        .route(
            "/week/{week_id}/type/{item_type}",
            get(learning_items::items_by_week_and_type),
        )
        .merge(
            Router::new()
                .route("/", post(learning_items::create_item))
                .route(
                    "/{id}",
                    put(learning_items::update_item).delete(learning_items::delete_item),
                )
                .route("/week/{week_id}/reorder", post(learning_items::reorder_items))
                .route(
                    "/{id}/documents",
                    post(learning_items::upload_item_document).layer(upload_limit.clone()),
                )
                .route(
                    "/{id}/documents/{document_id}",
                    delete(learning_items::remove_item_document),
                )
                .layer(teacher_only())
                .layer(authenticated()),
        );

    let document_routes = Router::new()
        .route("/{id}", get(documents::get_document))
        .route("/user", get(documents::my_documents))
        .route(
            "/learning-item/{learning_item_id}",
            get(documents::documents_by_learning_item),
        )
        .route("/standalone", get(documents::standalone_documents))
        .route("/search", get(documents::search_documents))
        .merge(
            Router::new()
                .route(
                    "/",
                    post(documents::upload_document).layer(upload_limit),
                )
                .route(
                    "/{id}",
                    put(documents::update_document).delete(documents::delete_document),
                )
                .route(
                    "/{id}/associate/{learning_item_id}",
                    put(documents::associate_document),
                )
                .route("/{id}/disassociate", put(documents::disassociate_document))
                .layer(teacher_only()),
        )
        .layer(authenticated());

    let enrollment_routes = Router::new()
        .route("/", post(enrollments::enroll))
        .route("/my-courses", get(enrollments::my_courses))
        .layer(authenticated());

    let quiz_bank_routes = Router::new()
        .route("/", get(quiz_banks::active_banks))
        .route("/{id}", get(quiz_banks::get_bank))
        .route("/teacher/{teacher_id}", get(quiz_banks::banks_by_teacher))
        .merge(
            Router::new()
                .route("/", post(quiz_banks::create_bank))
                .route(
                    "/{id}",
                    put(quiz_banks::update_bank).delete(quiz_banks::delete_bank),
                )
                .route(
                    "/{id}/learning-items",
                    put(quiz_banks::associate_learning_item),
                )
                .layer(teacher_only()),
        )
        .layer(authenticated());

    // Question reads expose correct answers, so the whole module is for authors.
    let question_routes = Router::new()
        .route("/", post(questions::create_question))
        .route(
            "/{id}",
            get(questions::get_question)
                .put(questions::update_question)
                .delete(questions::delete_question),
        )
        .route("/quiz-bank/{quiz_bank_id}", get(questions::questions_by_bank))
        .route(
            "/quiz-bank/{quiz_bank_id}/random",
            get(questions::random_questions),
        )
        .layer(teacher_only())
        .layer(authenticated());

    let quiz_routes = Router::new()
        .route("/attempt", post(quizzes::start_attempt))
        .route("/attempt/{id}", get(quizzes::get_attempt))
        .route("/attempt/{id}/answers", put(quizzes::submit_answers))
        .route("/attempt/{id}/complete", put(quizzes::complete_attempt))
        .route("/attempt/{id}/results", get(quizzes::get_results))
        .route("/attempt/{id}/questions", get(quizzes::attempt_questions))
        .route(
            "/student/{student_id}/attempts",
            get(quizzes::attempts_by_student),
        )
        .route(
            "/student/{student_id}/history",
            get(quizzes::student_history),
        )
        .layer(authenticated());

    Router::new()
        .merge(auth_routes)
        .nest("/courses", course_routes)
        .nest("/weeks", week_routes)
        .nest("/learning-items", learning_item_routes)
        .nest("/documents", document_routes)
        .nest("/enrollments", enrollment_routes)
        .nest("/api/quiz-banks", quiz_bank_routes)
        .nest("/api/questions", question_routes)
        .nest("/api/quizzes", quiz_routes)
        .route("/files/{*path}", get(files::serve_file))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
