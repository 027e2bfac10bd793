//! Error types for the tiered cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache and its HTTP front-end.
///
/// Disk read and deserialize failures never show up here: the disk tier
/// reports them as misses.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in any tier
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration misuse detected at build time
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Disk tier write, remove or listing failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The caller-supplied fetcher failed
    #[error("Fetcher failed: {0}")]
    Fetch(#[from] anyhow::Error),

    /// Internal error (e.g. a blocking disk task panicked)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<tokio::task::JoinError> for CacheError {
    fn from(err: tokio::task::JoinError) -> Self {
        CacheError::Internal(format!("disk task failed: {}", err))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Fetch(_) => StatusCode::BAD_GATEWAY,
            CacheError::Config(_)
            | CacheError::Io(_)
            | CacheError::Serialization(_)
            | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
