//! API Handlers
//!
//! HTTP request handlers for the admin endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::config::Config;
use crate::error::{QueryError, Result};
use crate::models::{
    ActiveRequestsResponse, ClearResponse, DeleteResponse, HealthResponse,
    InvalidatePatternRequest, InvalidateResponse,
};
use crate::query::{QueryCache, QueryStats};

/// Application state shared across all handlers.
///
/// Holds the process-wide query cache; JSON values are the payload type at
/// the composition root.
#[derive(Clone)]
pub struct AppState {
    pub queries: QueryCache<Value>,
}

impl AppState {
    /// Creates a new AppState around an existing query cache.
    pub fn new(queries: QueryCache<Value>) -> Self {
        Self { queries }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(QueryCache::new(config))
    }
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<QueryStats> {
    Json(state.queries.stats().await)
}

/// Handler for GET /dedup/active
pub async fn active_requests_handler(State(state): State<AppState>) -> Json<ActiveRequestsResponse> {
    Json(ActiveRequestsResponse::new(
        state.queries.dedup().active_requests(),
    ))
}

/// Handler for DELETE /cache/:key
pub async fn invalidate_key_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if !state.queries.invalidate(&key).await {
        return Err(QueryError::NotFound(key));
    }

    Ok(Json(DeleteResponse::new(key, "Cache entry")))
}

/// Handler for POST /cache/invalidate
pub async fn invalidate_pattern_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidatePatternRequest>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(QueryError::InvalidKey(error_msg));
    }

    let removed = state.queries.invalidate_pattern(&req.pattern).await?;

    Ok(Json(InvalidateResponse {
        pattern: req.pattern,
        removed,
    }))
}

/// Handler for DELETE /dedup/:key
pub async fn force_cleanup_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if !state.queries.dedup().force_cleanup(&key) {
        return Err(QueryError::NotFound(key));
    }

    Ok(Json(DeleteResponse::new(key, "In-flight request")))
}

/// Handler for POST /clear
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.queries.clear().await;
    Json(ClearResponse::cleared())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state() -> AppState {
        AppState::from_config(&Config::default())
    }

    async fn seed(state: &AppState, key: &str) {
        state
            .queries
            .resolve(key, None, || async { Ok::<_, anyhow::Error>(json!({"rows": 1})) })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = state();
        seed(&state, "deals").await;

        let stats = stats_handler(State(state)).await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.cache.size, 1);
    }

    #[tokio::test]
    async fn test_invalidate_key_handler() {
        let state = state();
        seed(&state, "deals").await;

        let result = invalidate_key_handler(State(state.clone()), Path("deals".to_string())).await;
        assert!(result.is_ok());

        let result = invalidate_key_handler(State(state), Path("deals".to_string())).await;
        assert!(matches!(result, Err(QueryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invalidate_pattern_handler() {
        let state = state();
        seed(&state, "user:1").await;
        seed(&state, "user:2").await;
        seed(&state, "org:1").await;

        let req = InvalidatePatternRequest {
            pattern: "^user:".to_string(),
        };
        let response = invalidate_pattern_handler(State(state), Json(req))
            .await
            .unwrap();
        assert_eq!(response.removed, 2);
    }

    #[tokio::test]
    async fn test_invalidate_pattern_handler_rejects_bad_regex() {
        let req = InvalidatePatternRequest {
            pattern: "(".to_string(),
        };
        let result = invalidate_pattern_handler(State(state()), Json(req)).await;
        assert!(matches!(result, Err(QueryError::InvalidPattern(_))));
    }

    #[tokio::test]
    async fn test_force_cleanup_handler_missing_key() {
        let result = force_cleanup_handler(State(state()), Path("none".to_string())).await;
        assert!(matches!(result, Err(QueryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_active_requests_handler_empty() {
        let response = active_requests_handler(State(state())).await;
        assert_eq!(response.count, 0);
    }

    #[tokio::test]
    async fn test_clear_handler() {
        let state = state();
        seed(&state, "deals").await;

        let response = clear_handler(State(state.clone())).await;

        assert!(response.message.contains("cleared"));
        assert_eq!(state.queries.stats().await.cache.size, 0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
