// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, patch, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{attempts, exams, results},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Exams: public read, owner-only writes.
/// * Attempts and personal results: authenticated respondents.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let exam_routes = Router::new()
        .route(
            "/",
            get(exams::list_exams)
                .post(exams::create_exam)
                .route_layer(auth.clone()),
        )
        .route(
            "/{id}",
            // Anyone holding the link may read; only the owner may write.
            get(exams::get_exam).merge(
                patch(exams::update_exam)
                    .delete(exams::delete_exam)
                    .route_layer(auth.clone()),
            ),
        )
        .merge(
            Router::new()
                .route("/{id}/definition", get(exams::get_exam_definition))
                .route("/{id}/results", get(results::list_exam_results))
                .route("/{id}/results/summary", get(results::exam_results_summary))
                .route_layer(auth.clone()),
        );

    let attempt_routes = Router::new()
        .route("/", post(attempts::start_attempt))
        .route("/{id}", get(attempts::get_attempt))
        .route("/{id}/answers", put(attempts::answer_question))
        .route("/{id}/position", put(attempts::seek_question))
        .route("/{id}/submit", post(attempts::submit_attempt))
        .route_layer(auth.clone());

    let result_routes = Router::new()
        .route("/", get(results::list_my_results))
        .route_layer(auth);

    Router::new()
        .nest("/api/exams", exam_routes)
        .nest("/api/attempts", attempt_routes)
        .nest("/api/results", result_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
