//! API Module
//!
//! HTTP handlers and routing for the admin surface of the query cache.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Combined statistics
//! - `GET /dedup/active` - In-flight requests
//! - `DELETE /cache/:key` - Invalidate one entry
//! - `POST /cache/invalidate` - Invalidate by pattern
//! - `DELETE /dedup/:key` - Force-remove an in-flight request
//! - `POST /clear` - Clear everything

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
