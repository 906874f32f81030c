//! Query Cache - in-process query result caching with request deduplication
//!
//! Memoizes query results under a TTL policy with bounded memory, and
//! coalesces concurrent identical requests into one shared execution.

pub mod api;
pub mod cache;
pub mod config;
pub mod dedup;
pub mod error;
pub mod models;
pub mod query;
pub mod tasks;

pub use api::AppState;
pub use cache::TtlCache;
pub use config::Config;
pub use dedup::Deduplicator;
pub use error::{QueryError, Result};
pub use query::{query_key, QueryCache};
pub use tasks::BackgroundTasks;
