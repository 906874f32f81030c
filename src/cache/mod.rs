//! Cache Module
//!
//! Provides bounded in-memory caching with per-entry TTL expiration and
//! insertion-age eviction.

use std::time::Duration;

mod entry;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::TtlCache;

// == Public Constants ==
/// TTL applied to entries stored without one
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Default maximum number of entries
pub const DEFAULT_MAX_SIZE: usize = 1000;

/// Share of remaining entries evicted when cleanup cannot free space
/// through expiry alone
pub const EVICTION_PERCENT: usize = 20;
