//! Error types for the query cache
//!
//! Provides unified error handling using thiserror.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Query Error Enum ==
/// Unified error type for the cache, the deduplicator and the orchestrator.
///
/// `Clone` is required because one settled outcome is handed to every caller
/// attached to the same in-flight request.
#[derive(Error, Debug, Clone)]
pub enum QueryError {
    /// The producer function failed; relayed verbatim to every waiter
    #[error("Producer failed: {0}")]
    Producer(Arc<anyhow::Error>),

    /// The caller's wait exceeded its bound
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Empty or otherwise unusable key
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Malformed invalidation pattern
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Resource addressed by the admin API does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The producer task panicked or was cancelled before settling
    #[error("Producer task aborted: {0}")]
    Aborted(String),
}

impl QueryError {
    /// Wraps a producer failure so it can be shared between waiters.
    pub fn producer(err: anyhow::Error) -> Self {
        QueryError::Producer(Arc::new(err))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let status = match &self {
            QueryError::InvalidKey(_) | QueryError::InvalidPattern(_) => StatusCode::BAD_REQUEST,
            QueryError::NotFound(_) => StatusCode::NOT_FOUND,
            QueryError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            QueryError::Producer(_) => StatusCode::BAD_GATEWAY,
            QueryError::Aborted(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the query cache.
pub type Result<T> = std::result::Result<T, QueryError>;
