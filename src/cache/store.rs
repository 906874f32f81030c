//! Cache Store Module
//!
//! Main cache engine: HashMap storage with per-entry TTL and insertion-age
//! eviction when the store reaches capacity.

use std::collections::HashMap;
use std::time::Duration;

use regex::Regex;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, DEFAULT_MAX_SIZE, DEFAULT_TTL, EVICTION_PERCENT};
use crate::error::{QueryError, Result};

// == TTL Cache ==
/// Bounded key-value store where each entry carries its own TTL.
#[derive(Debug)]
pub struct TtlCache<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_size: usize,
    /// TTL for entries stored without an explicit one
    default_ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    // == Constructor ==
    /// Creates a new TtlCache with specified capacity and default TTL.
    ///
    /// # Arguments
    /// * `max_size` - Maximum number of entries the cache can hold; a zero
    ///   capacity is raised to one
    /// * `default_ttl` - TTL applied when `set` is called without one
    pub fn new(max_size: usize, default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            max_size: max_size.max(1),
            default_ttl,
        }
    }

    // == Set ==
    /// Stores a value under `key`, replacing any previous entry and its TTL.
    ///
    /// When a new key would push the store past `max_size`, expired entries
    /// are dropped first, then the oldest insertions.
    ///
    /// # Arguments
    /// * `key` - The key to store, must not be empty
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL (uses default_ttl if None)
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Option<Duration>) -> Result<()> {
        let key = key.into();
        if key.is_empty() {
            return Err(QueryError::InvalidKey("cache key cannot be empty".to_string()));
        }

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_size {
            self.cleanup();
        }

        let entry = CacheEntry::new(value, ttl.unwrap_or(self.default_ttl));
        self.entries.insert(key, entry);
        self.stats.record_set();

        Ok(())
    }

    // == Get ==
    /// Retrieves a live value by key.
    ///
    /// Expired entries are removed on discovery and counted as misses.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let expired = match self.entries.get(key) {
            None => {
                self.stats.record_miss();
                return None;
            }
            Some(entry) => entry.is_expired(),
        };

        if expired {
            self.entries.remove(key);
            self.stats.record_miss();
            return None;
        }

        self.stats.record_hit();
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Contains Key ==
    /// Returns true if a live entry exists, without touching the counters.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }

    // == Delete ==
    /// Removes an entry by key, returning whether one was present.
    pub fn delete(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.stats.record_deletes(1);
        }
        removed
    }

    // == Invalidate Pattern ==
    /// Removes every key matching the regular expression `pattern`,
    /// expired or not.
    ///
    /// Returns the number of entries removed. A malformed pattern is
    /// reported before anything is touched.
    pub fn invalidate_pattern(&mut self, pattern: &str) -> Result<usize> {
        let regex = Regex::new(pattern)?;

        let before = self.entries.len();
        self.entries.retain(|key, _| !regex.is_match(key));
        let removed = before - self.entries.len();

        self.stats.record_deletes(removed);
        debug!(pattern, removed, "Invalidated cache entries by pattern");
        Ok(removed)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_size(self.entries.len());
        stats
    }

    // == Clear ==
    /// Empties the store and resets every counter.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats = CacheStats::new();
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        before - self.entries.len()
    }

    // == Capacity Cleanup ==
    /// Makes room for one insertion: expired entries go first, then the
    /// oldest `EVICTION_PERCENT` of what remains by insertion time (at least
    /// one entry).
    fn cleanup(&mut self) {
        let expired = self.cleanup_expired();

        let mut evicted = 0;
        if self.entries.len() >= self.max_size {
            let mut by_age: Vec<_> = self
                .entries
                .iter()
                .map(|(key, entry)| (entry.created_at, key.clone()))
                .collect();
            by_age.sort();

            let count = (by_age.len() * EVICTION_PERCENT / 100).max(1);
            for (_, key) in by_age.into_iter().take(count) {
                self.entries.remove(&key);
                evicted += 1;
            }
        }

        debug!(expired, evicted, size = self.entries.len(), "Cache cleanup complete");
    }

    // == Length ==
    /// Returns the current number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE, DEFAULT_TTL)
    }
}
