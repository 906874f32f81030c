//! Deduplication Metrics
//!
//! Store-wide counters for the request deduplicator.

use std::time::Duration;

use serde::Serialize;

// == Metrics State ==
/// Running counters owned by the deduplicator's lock.
#[derive(Debug, Clone, Default)]
pub(crate) struct MetricsState {
    pub total_requests: u64,
    pub deduplicated_requests: u64,
    /// Producer executions that settled while still owning their record
    pub settled_executions: u64,
    /// Incremental mean of producer execution time, in milliseconds
    pub average_wait_ms: f64,
}

impl MetricsState {
    pub fn record_request(&mut self) {
        self.total_requests += 1;
    }

    pub fn record_deduplicated(&mut self) {
        self.deduplicated_requests += 1;
    }

    /// Folds one execution time into the running mean:
    /// `avg' = avg + (d - avg) / n`.
    pub fn record_settlement(&mut self, elapsed: Duration) {
        self.settled_executions += 1;
        let duration_ms = elapsed.as_secs_f64() * 1000.0;
        self.average_wait_ms += (duration_ms - self.average_wait_ms) / self.settled_executions as f64;
    }

    pub fn snapshot(&self, active_requests: usize) -> DedupMetrics {
        let deduplication_rate = if self.total_requests == 0 {
            0.0
        } else {
            self.deduplicated_requests as f64 / self.total_requests as f64 * 100.0
        };

        DedupMetrics {
            total_requests: self.total_requests,
            deduplicated_requests: self.deduplicated_requests,
            active_requests,
            average_wait_time_ms: self.average_wait_ms,
            deduplication_rate,
        }
    }
}

// == Dedup Metrics ==
/// Point-in-time view of deduplicator activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DedupMetrics {
    /// Every call to `run`, deduplicated or not
    pub total_requests: u64,
    /// Calls that attached to an existing in-flight request
    pub deduplicated_requests: u64,
    /// In-flight records right now
    pub active_requests: usize,
    /// Mean producer execution time in milliseconds
    pub average_wait_time_ms: f64,
    /// Percentage of calls that were deduplicated
    pub deduplication_rate: f64,
}
