//! Error types for the asset cache
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
/// Unified error type for the caching subsystem.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key or asset not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Storage backend rejected a write because its quota is used up
    #[error("Storage quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Storage backend I/O failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Stored value could not be decoded
    #[error("Corrupt entry: {0}")]
    Corrupt(String),

    /// Asset fetch failed (transport error or non-success status)
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// Upstream origin could not be reached by the proxy
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Corrupt(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::QuotaExceeded(_) => StatusCode::INSUFFICIENT_STORAGE,
            CacheError::Fetch(_) | CacheError::Upstream(_) => StatusCode::BAD_GATEWAY,
            CacheError::Storage(_) | CacheError::Corrupt(_) | CacheError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the asset cache.
pub type Result<T> = std::result::Result<T, CacheError>;
