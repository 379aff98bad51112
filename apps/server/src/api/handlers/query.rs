//! Query endpoint handler

use axum::{body::Bytes, extract::State, Extension, Json};
use serde_json::Value as JsonValue;

use crate::models::QueryResponse;
use crate::request_context::RequestContext;
use crate::state::AppState;
use crate::{Error, Result};

/// Handler for `POST /query`
///
/// The body is read as JSON whatever its content type. A body that is not a
/// query is a 400; everything after that is reported per view.
pub async fn query_handler(
    State(state): State<AppState>,
    context: Option<Extension<RequestContext>>,
    body: Bytes,
) -> Result<Json<QueryResponse>> {
    let body: JsonValue = serde_json::from_slice(&body)
        .map_err(|_| Error::InvalidQuery("invalid json".to_string()))?;
    let response = state.querier.handle_json(body).await?;

    if let Some(Extension(context)) = context {
        tracing::debug!(
            request_id = %context.request_id,
            views = response.len(),
            "Answered query"
        );
    }
    Ok(Json(response))
}
