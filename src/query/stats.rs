//! Query Statistics
//!
//! Orchestrator-level counters plus a combined snapshot of both components.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::cache::CacheStats;
use crate::dedup::DedupMetrics;

// == Query Counters ==
/// Lock-free counters for `resolve` outcomes.
#[derive(Debug, Default)]
pub(crate) struct QueryCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
}

impl QueryCounters {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self, cache: CacheStats, dedup: DedupMetrics) -> QueryStats {
        QueryStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            cache,
            dedup,
        }
    }
}

// == Query Stats ==
/// Combined view of orchestrator, cache and deduplicator activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryStats {
    /// Resolves answered from the cache
    pub hits: u64,
    /// Resolves that went to the producer (directly or by attaching)
    pub misses: u64,
    /// Resolves that ended in an error
    pub errors: u64,
    pub cache: CacheStats,
    pub dedup: DedupMetrics,
}
