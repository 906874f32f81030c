//! Query Module
//!
//! Composes the TTL cache and the request deduplicator into a cache-aside
//! resolver for arbitrary async producers.

mod key;
mod orchestrator;
mod stats;

pub use key::query_key;
pub use orchestrator::QueryCache;
pub use stats::QueryStats;
