//! Deduplication Module
//!
//! Coalesces concurrent identical requests into one shared execution.

mod deduplicator;
mod metrics;
mod sanitize;

pub use deduplicator::{ActiveRequest, Deduplicator, DEFAULT_MAX_AGE};
pub use metrics::DedupMetrics;
pub use sanitize::{display_key, sanitize_key, DISPLAY_KEY_MAX_CHARS};
