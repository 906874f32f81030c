//! Stale Request Sweep
//!
//! Periodically drops in-flight records whose producer never settled.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::dedup::Deduplicator;
use crate::tasks::BackgroundTask;

/// Default interval between sweeps
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Spawns the periodic sweep of stale in-flight records.
///
/// Each removal is logged by the deduplicator; callers arriving afterwards
/// start a fresh execution for that key.
pub fn spawn_dedup_sweep_task<V>(dedup: Deduplicator<V>, interval: Duration) -> BackgroundTask
where
    V: Clone + Send + Sync + 'static,
{
    let handle = tokio::spawn(async move {
        info!(
            interval_secs = interval.as_secs(),
            max_age_secs = dedup.max_age().as_secs(),
            "Starting in-flight request sweep"
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = dedup.sweep_stale();
            if removed > 0 {
                warn!(removed, "Swept stale in-flight requests");
            } else {
                debug!("In-flight sweep: nothing stale");
            }
        }
    });

    BackgroundTask::new("dedup_sweep", handle)
}
