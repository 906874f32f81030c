//! Request Deduplicator
//!
//! Coalesces concurrent calls for the same key into a single producer
//! execution whose outcome is shared by every caller.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::dedup::metrics::{DedupMetrics, MetricsState};
use crate::dedup::sanitize::{display_key, sanitize_key};
use crate::error::{QueryError, Result};

/// Age after which an in-flight request no longer accepts new waiters
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(30);

type SharedOutcome<V> = Shared<BoxFuture<'static, Result<V>>>;

// == In-Flight Record ==
struct InFlight<V> {
    /// Distinguishes this record from a later replacement under the same key
    generation: u64,
    outcome: SharedOutcome<V>,
    started_at: Instant,
    waiter_count: usize,
}

impl<V> InFlight<V> {
    fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }
}

struct DedupState<V> {
    records: HashMap<String, InFlight<V>>,
    next_generation: u64,
    metrics: MetricsState,
}

struct Inner<V> {
    state: Mutex<DedupState<V>>,
    max_age: Duration,
}

// == Active Request ==
/// Introspection view of one in-flight request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveRequest {
    /// Sanitized, truncated key
    pub key: String,
    /// Milliseconds since the producer started
    pub age_ms: u64,
    /// Callers attached so far, the originator included
    pub waiter_count: usize,
}

// == Deduplicator ==
/// Tracks in-flight producer executions by key.
///
/// Cloning is cheap and every clone shares the same in-flight table.
pub struct Deduplicator<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for Deduplicator<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Default for Deduplicator<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_MAX_AGE)
    }
}

impl<V> Deduplicator<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a deduplicator whose records stop accepting waiters after
    /// `max_age`.
    pub fn new(max_age: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(DedupState {
                    records: HashMap::new(),
                    next_generation: 0,
                    metrics: MetricsState::default(),
                }),
                max_age,
            }),
        }
    }

    pub fn max_age(&self) -> Duration {
        self.inner.max_age
    }

    // == Run ==
    /// Runs `producer` for `key` unless an execution for that key is already
    /// in flight, in which case its outcome is awaited instead.
    ///
    /// The producer runs on its own task, so the execution and its
    /// bookkeeping complete even if every caller stops waiting.
    pub async fn run<F, Fut>(&self, key: &str, producer: F) -> Result<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        if key.is_empty() {
            return Err(QueryError::InvalidKey(
                "request key cannot be empty".to_string(),
            ));
        }

        let outcome = self.attach_or_start(key, producer);
        outcome.await
    }

    // == Run With Timeout ==
    /// Same as `run`, but this caller gives up after `timeout`.
    ///
    /// Only the wait is abandoned: the producer keeps running and other
    /// waiters still receive its outcome.
    pub async fn run_with_timeout<F, Fut>(
        &self,
        key: &str,
        producer: F,
        timeout: Duration,
    ) -> Result<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        match tokio::time::timeout(timeout, self.run(key, producer)).await {
            Ok(result) => result,
            Err(_) => {
                debug!(key = %sanitize_key(key), ?timeout, "Caller stopped waiting for in-flight request");
                Err(QueryError::Timeout(timeout))
            }
        }
    }

    // Check-then-act under one lock acquisition; the guard never lives
    // across an await.
    fn attach_or_start<F, Fut>(&self, key: &str, producer: F) -> SharedOutcome<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let log_key = sanitize_key(key);
        let now = Instant::now();

        let mut guard = self.inner.state.lock();
        let state = &mut *guard;
        state.metrics.record_request();

        if let Some(record) = state.records.get_mut(key) {
            let age = record.age(now);
            if age < self.inner.max_age {
                record.waiter_count += 1;
                let waiters = record.waiter_count;
                let outcome = record.outcome.clone();
                state.metrics.record_deduplicated();
                debug!(key = %log_key, waiters, age_ms = age.as_millis() as u64, "Attached to in-flight request");
                return outcome;
            }

            warn!(
                key = %log_key,
                age_ms = age.as_millis() as u64,
                waiters = record.waiter_count,
                "Replacing stale in-flight request"
            );
            state.records.remove(key);
        }

        let generation = state.next_generation;
        state.next_generation += 1;

        let outcome = self.spawn_producer(key.to_string(), generation, log_key.clone(), producer);
        state.records.insert(
            key.to_string(),
            InFlight {
                generation,
                outcome: outcome.clone(),
                started_at: now,
                waiter_count: 1,
            },
        );
        debug!(key = %log_key, active = state.records.len(), "Started producer");

        outcome
    }

    fn spawn_producer<F, Fut>(
        &self,
        key: String,
        generation: u64,
        log_key: String,
        producer: F,
    ) -> SharedOutcome<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);

        let handle = tokio::spawn(async move {
            let started = Instant::now();
            let result = match AssertUnwindSafe(async move { producer().await })
                .catch_unwind()
                .await
            {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => Err(QueryError::producer(err)),
                Err(_) => Err(QueryError::Aborted("producer panicked".to_string())),
            };

            inner.settle(&key, generation, started.elapsed(), &log_key, result.is_ok());
            result
        });

        async move {
            handle
                .await
                .unwrap_or_else(|err| Err(QueryError::Aborted(err.to_string())))
        }
        .boxed()
        .shared()
    }

    // == Metrics ==
    /// Returns a snapshot of the deduplication counters.
    pub fn metrics(&self) -> DedupMetrics {
        let state = self.inner.state.lock();
        state.metrics.snapshot(state.records.len())
    }

    // == Force Cleanup ==
    /// Drops the in-flight record for `key` regardless of age.
    ///
    /// Callers already attached still receive the outcome; the next call for
    /// `key` starts a fresh execution. Returns whether a record existed.
    pub fn force_cleanup(&self, key: &str) -> bool {
        let removed = self.inner.state.lock().records.remove(key).is_some();
        if removed {
            info!(key = %sanitize_key(key), "Force-removed in-flight request");
        }
        removed
    }

    // == Sweep Stale ==
    /// Removes every record that has been in flight for `max_age` or longer.
    ///
    /// Returns the number of records removed.
    pub fn sweep_stale(&self) -> usize {
        let now = Instant::now();
        let max_age = self.inner.max_age;
        let mut removed = 0;

        self.inner.state.lock().records.retain(|key, record| {
            let age = record.age(now);
            if age < max_age {
                return true;
            }
            warn!(
                key = %sanitize_key(key),
                age_ms = age.as_millis() as u64,
                waiters = record.waiter_count,
                "Removing stale in-flight request"
            );
            removed += 1;
            false
        });

        removed
    }

    // == Active Requests ==
    /// Lists in-flight requests, oldest first.
    pub fn active_requests(&self) -> Vec<ActiveRequest> {
        let now = Instant::now();
        let state = self.inner.state.lock();

        let mut active: Vec<ActiveRequest> = state
            .records
            .iter()
            .map(|(key, record)| ActiveRequest {
                key: display_key(key),
                age_ms: record.age(now).as_millis() as u64,
                waiter_count: record.waiter_count,
            })
            .collect();
        active.sort_by(|a, b| b.age_ms.cmp(&a.age_ms));
        active
    }

    // == Clear ==
    /// Drops every in-flight record and resets the metrics.
    pub fn clear(&self) {
        let mut state = self.inner.state.lock();
        state.records.clear();
        state.metrics = MetricsState::default();
    }
}

impl<V> Inner<V> {
    /// Removes the record for `key` only if it is still the one this
    /// execution installed; a swept or replaced record is left alone.
    fn settle(&self, key: &str, generation: u64, elapsed: Duration, log_key: &str, succeeded: bool) {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let owned = state
            .records
            .get(key)
            .is_some_and(|record| record.generation == generation);
        if !owned {
            debug!(key = %log_key, succeeded, "Producer settled after its record was removed");
            return;
        }

        let waiters = state
            .records
            .remove(key)
            .map(|record| record.waiter_count)
            .unwrap_or_default();
        state.metrics.record_settlement(elapsed);

        debug!(
            key = %log_key,
            succeeded,
            waiters,
            elapsed_ms = elapsed.as_millis() as u64,
            active = state.records.len(),
            "In-flight request settled"
        );
    }
}
