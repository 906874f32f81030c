//! Background Tasks Module
//!
//! Contains background tasks that run periodically for the life of a query
//! cache.
//!
//! # Tasks
//! - TTL Cleanup: Removes expired cache entries at configured intervals
//! - In-flight Sweep: Removes deduplication records older than the max age

mod cleanup;
mod handle;
mod sweep;

pub use cleanup::spawn_cache_reaper_task;
pub use handle::{BackgroundTask, BackgroundTasks};
pub use sweep::{spawn_dedup_sweep_task, DEFAULT_SWEEP_INTERVAL};
