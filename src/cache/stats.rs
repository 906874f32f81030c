//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, sets and deletes.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of cache counters.
///
/// Counters are monotonic for the life of a store and reset only by `clear`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of lookups that found a live entry
    pub hits: u64,
    /// Number of lookups that found nothing or an expired entry
    pub misses: u64,
    /// Number of completed `set` calls
    pub sets: u64,
    /// Number of entries removed by `delete` or pattern invalidation
    pub deletes: u64,
    /// Percentage of lookups that were hits
    pub hit_rate: f64,
    /// Current number of entries in the cache
    pub size: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Recomputes `hit_rate` as a percentage, 0 when no lookups happened.
    fn refresh_hit_rate(&mut self) {
        let total = self.hits + self.misses;
        self.hit_rate = if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64 * 100.0
        };
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
        self.refresh_hit_rate();
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
        self.refresh_hit_rate();
    }

    pub fn record_set(&mut self) {
        self.sets += 1;
    }

    /// Adds `count` removed entries to the delete counter.
    pub fn record_deletes(&mut self, count: usize) {
        self.deletes += count as u64;
    }

    pub fn set_size(&mut self, size: usize) {
        self.size = size;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.sets, 0);
        assert_eq!(stats.deletes, 0);
        assert_eq!(stats.size, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate, 0.0);
    }

    #[test]
    fn test_hit_rate_all_hits() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        assert_eq!(stats.hit_rate, 100.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_miss();
        stats.record_miss();
        stats.record_miss();
        assert_eq!(stats.hit_rate, 25.0);
    }

    #[test]
    fn test_record_deletes() {
        let mut stats = CacheStats::new();
        stats.record_deletes(1);
        stats.record_deletes(3);
        assert_eq!(stats.deletes, 4);
    }
}
