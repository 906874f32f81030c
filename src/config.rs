//! Configuration Module
//!
//! Handles loading and managing cache and deduplicator parameters.

use std::env;
use std::time::Duration;

use crate::cache::{DEFAULT_MAX_SIZE, DEFAULT_TTL};
use crate::dedup::DEFAULT_MAX_AGE;
use crate::tasks::DEFAULT_SWEEP_INTERVAL;

/// Query cache configuration parameters.
///
/// Library types take these values at construction time; `from_env` exists
/// for the binary's composition root.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Default TTL in seconds for entries without explicit TTL
    pub default_ttl: u64,
    /// Seconds after which an in-flight request is considered stale
    pub dedup_max_age: u64,
    /// Interval in seconds between stale in-flight request sweeps
    pub sweep_interval: u64,
    /// Interval in seconds between expired cache entry reaps
    pub cache_reap_interval: u64,
    /// HTTP admin server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries, at least 1 (default: 1000)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `DEDUP_MAX_AGE` - In-flight record max age in seconds (default: 30)
    /// - `SWEEP_INTERVAL` - Stale record sweep frequency in seconds (default: 60)
    /// - `CACHE_REAP_INTERVAL` - Expired entry reap frequency in seconds (default: 60)
    /// - `SERVER_PORT` - HTTP admin port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: match env_or("MAX_ENTRIES", defaults.max_entries) {
                0 => defaults.max_entries,
                max => max,
            },
            default_ttl: env_or("DEFAULT_TTL", defaults.default_ttl),
            dedup_max_age: env_or("DEDUP_MAX_AGE", defaults.dedup_max_age),
            sweep_interval: env_or("SWEEP_INTERVAL", defaults.sweep_interval),
            cache_reap_interval: env_or("CACHE_REAP_INTERVAL", defaults.cache_reap_interval),
            server_port: env_or("SERVER_PORT", defaults.server_port),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }

    pub fn dedup_max_age(&self) -> Duration {
        Duration::from_secs(self.dedup_max_age)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }

    pub fn cache_reap_interval(&self) -> Duration {
        Duration::from_secs(self.cache_reap_interval)
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_SIZE,
            default_ttl: DEFAULT_TTL.as_secs(),
            dedup_max_age: DEFAULT_MAX_AGE.as_secs(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL.as_secs(),
            cache_reap_interval: DEFAULT_SWEEP_INTERVAL.as_secs(),
            server_port: 3000,
        }
    }
}
