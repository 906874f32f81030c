//! Background Task Handles
//!
//! Explicit stop/drop lifecycle for periodic maintenance tasks.

use tokio::task::JoinHandle;
use tracing::debug;

// == Background Task ==
/// Owns a spawned periodic task; the task stops on `stop()` or on drop.
#[derive(Debug)]
pub struct BackgroundTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl BackgroundTask {
    pub(crate) fn new(name: &'static str, handle: JoinHandle<()>) -> Self {
        Self { name, handle }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Aborts the task. Idempotent.
    pub fn stop(&self) {
        if !self.handle.is_finished() {
            self.handle.abort();
            debug!(task = self.name, "Background task stopped");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for BackgroundTask {
    fn drop(&mut self) {
        self.stop();
    }
}

// == Background Tasks ==
/// The maintenance tasks of one query cache.
#[derive(Debug)]
pub struct BackgroundTasks {
    /// Removes in-flight records older than the max age
    pub dedup_sweep: BackgroundTask,
    /// Removes expired cache entries
    pub cache_reaper: BackgroundTask,
}

impl BackgroundTasks {
    /// Stops both tasks.
    pub fn stop(&self) {
        self.dedup_sweep.stop();
        self.cache_reaper.stop();
    }
}
