// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, performance, planner, test_paper},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (tests, users, planner, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (store and config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let test_routes = Router::new()
        .route("/generate", get(test_paper::generate_test))
        .route("/submit", post(test_paper::submit_test))
        .route("/{test_id}/summary", get(test_paper::get_test_summary))
        .route("/{test_id}/performance", get(test_paper::get_test_performance));

    let user_routes = Router::new()
        .route("/{user_id}/performance", get(performance::get_user_performance))
        .route("/{user_id}/history", get(performance::get_user_history));

    let admin_routes = Router::new()
        .route("/questions", post(admin::import_questions))
        .route(
            "/questions/{id}",
            get(admin::get_question).delete(admin::delete_question),
        )
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/api/subjects", get(performance::list_subjects))
        .route("/api/planner", post(planner::create_plan))
        .nest("/api/tests", test_routes)
        .nest("/api/users", user_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
