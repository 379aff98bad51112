//! Error types for the event index

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid text query: {0}")]
    TextQuery(String),

    #[error("Invalid document on line {line}: {message}")]
    InvalidDocument { line: usize, message: String },

    #[error("Index unavailable: {0}")]
    Unavailable(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
