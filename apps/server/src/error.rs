//! Error types for the query service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown constraint type \"{0}\"")]
    UnknownConstraint(String),

    #[error("unknown view type \"{0}\"")]
    UnknownView(String),

    #[error("{0}")]
    InvalidQuery(String),

    /// Failure whose message is meant for the client, e.g. an over-broad query.
    #[error("{0}")]
    QueryHandling(String),

    #[error("Index error: {0}")]
    Index(#[from] lensing_index::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Value of the `error` entry sent for a failed view: the message for
/// client-facing failures, otherwise a bare `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorFlag {
    Message(String),
    Flag(bool),
}

impl Error {
    pub fn client_message(&self) -> ErrorFlag {
        match self {
            Error::QueryHandling(message) => ErrorFlag::Message(message.clone()),
            _ => ErrorFlag::Flag(true),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Error::InvalidQuery(_) | Error::UnknownConstraint(_) | Error::UnknownView(_) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            Error::QueryHandling(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            Error::Index(_) | Error::Config(_) | Error::Internal(_) | Error::Other(_) => {
                tracing::error!("Internal error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "status": "error",
            "message": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_errors_surface_their_message() {
        let err = Error::QueryHandling("too many matching events".to_string());
        assert_eq!(
            err.client_message(),
            ErrorFlag::Message("too many matching events".to_string())
        );
    }

    #[test]
    fn other_errors_are_opaque() {
        let err = Error::Internal("index handle poisoned".to_string());
        assert_eq!(err.client_message(), ErrorFlag::Flag(true));
        assert_eq!(
            serde_json::to_value(err.client_message()).unwrap(),
            serde_json::json!(true)
        );
    }

    #[test]
    fn invalid_query_maps_to_bad_request() {
        let response = Error::InvalidQuery("missing views".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
