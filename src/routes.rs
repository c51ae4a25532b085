// src/routes.rs

use axum::{
    Router,
    http::{Method, header},
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{auth, health, questions, submissions, users},
    services::authorizer::{auth_middleware, staff_middleware},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Auth routes are public; they are also the identity service other
///   components call to authorize requests.
/// * Question listing is public, question creation is staff-only.
/// * Submissions and user profiles require a resolved identity; the user
///   listing is staff-only.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/validate", get(auth::validate))
        .route("/me", get(auth::me));

    // Staff-only creation: auth first, then the role check
    let question_routes = get(questions::list_questions).merge(
        post(questions::create_question)
            .layer(middleware::from_fn(staff_middleware))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
    );

    let protected_routes = Router::new()
        .route("/submit", post(submissions::submit))
        .route("/submissions/{id}", get(submissions::get_submission))
        .route(
            "/users",
            get(users::list_users).layer(middleware::from_fn(staff_middleware)),
        )
        .route("/users/{username}", get(users::get_user))
        .route(
            "/users/{username}/submissions",
            get(submissions::list_user_submissions),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/healthz", get(health::healthz))
        .nest("/api/auth", auth_routes)
        .route("/api/questions", question_routes)
        .nest("/api", protected_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
