//! Query API Routes

use crate::api::handlers::query;
use crate::state::AppState;
use axum::{routing::post, Router};

pub fn query_routes() -> Router<AppState> {
    Router::new().route("/query", post(query::query_handler))
}
