//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries, so
//! entries nobody reads again do not sit in memory until capacity cleanup.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::TtlCache;
use crate::tasks::BackgroundTask;

/// Spawns a background task that periodically cleans up expired cache entries.
///
/// The task sleeps for `interval` between runs and takes the write lock only
/// for the duration of one sweep.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(RwLock::new(TtlCache::<String>::new(1000, Duration::from_secs(300))));
/// let reaper = spawn_cache_reaper_task(cache.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// reaper.stop();
/// ```
pub fn spawn_cache_reaper_task<V>(cache: Arc<RwLock<TtlCache<V>>>, interval: Duration) -> BackgroundTask
where
    V: Clone + Send + Sync + 'static,
{
    let handle = tokio::spawn(async move {
        info!(interval_secs = interval.as_secs(), "Starting cache TTL reaper");

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.write().await.cleanup_expired();

            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    });

    BackgroundTask::new("cache_reaper", handle)
}
