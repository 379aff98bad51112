//! API layer - routes, handlers, and middleware

pub mod handlers;
pub mod middleware;
pub mod routes;

use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::json;
use tower::ServiceBuilder;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let max_body_size = state.config.server.max_request_body_size;
    let cors_origins = state.config.server.cors_origins.clone();

    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
        .route("/favicon.ico", get(favicon))
        .merge(routes::query::query_routes())
        .merge(routes::metrics::metrics_routes())
        .with_state(state)
        // Outermost first
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(max_body_size))
                .layer(middleware::cors(&cors_origins))
                .layer(middleware::compression())
                .layer(axum::middleware::from_fn(middleware::metrics_middleware))
                .layer(axum::middleware::from_fn(middleware::request_id_middleware)),
        )
}

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "lensing"
    }))
}

async fn root(State(state): State<AppState>) -> impl IntoResponse {
    let caches = state.querier.cache_sizes();
    (
        StatusCode::OK,
        Json(json!({
            "server": "lensing",
            "version": env!("CARGO_PKG_VERSION"),
            "caches": caches,
            "status": "running"
        })),
    )
}

async fn favicon() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}
