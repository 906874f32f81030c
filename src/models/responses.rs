//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::dedup::ActiveRequest;

/// Response body for key removals (DELETE /cache/:key, DELETE /dedup/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was removed
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>, what: &str) -> Self {
        let key = key.into();
        Self {
            message: format!("{} '{}' removed", what, key),
            key,
        }
    }
}

/// Response body for pattern invalidation (POST /cache/invalidate)
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub pattern: String,
    /// Number of cache entries removed
    pub removed: usize,
}

/// Response body for GET /dedup/active
#[derive(Debug, Clone, Serialize)]
pub struct ActiveRequestsResponse {
    pub count: usize,
    pub requests: Vec<ActiveRequest>,
}

impl ActiveRequestsResponse {
    pub fn new(requests: Vec<ActiveRequest>) -> Self {
        Self {
            count: requests.len(),
            requests,
        }
    }
}

/// Response body for POST /clear
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
}

impl ClearResponse {
    pub fn cleared() -> Self {
        Self {
            message: "Cache and in-flight requests cleared".to_string(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_response_serialize() {
        let resp = DeleteResponse::new("user:1", "Cache entry");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("user:1"));
        assert!(json.contains("Cache entry 'user:1' removed"));
    }

    #[test]
    fn test_active_requests_count() {
        let resp = ActiveRequestsResponse::new(vec![ActiveRequest {
            key: "k".to_string(),
            age_ms: 12,
            waiter_count: 3,
        }]);
        assert_eq!(resp.count, 1);

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["requests"][0]["waiter_count"], 3);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
