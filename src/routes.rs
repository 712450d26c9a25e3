// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{health, quiz, session},
    state::AppState,
    utils::jwt::session_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (health, sessions, quiz).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (config, completion provider, session store).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    // Every quiz route acts on the caller's own session
    let quiz_routes = Router::new()
        .route("/api/quiz", get(quiz::get_quiz))
        .route("/api/quiz/generate", post(quiz::generate_quiz))
        .route("/api/quiz/answer", post(quiz::answer_question))
        .route("/api/quiz/submit", post(quiz::submit_quiz))
        .route("/api/quiz/reset", post(quiz::reset_quiz))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ));

    Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/sessions", post(session::create_session))
        .merge(quiz_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
