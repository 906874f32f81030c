//! Cached-Query Orchestrator
//!
//! Cache-aside composition of the TTL cache and the request deduplicator.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::TtlCache;
use crate::config::Config;
use crate::dedup::{sanitize_key, Deduplicator};
use crate::error::{QueryError, Result};
use crate::query::stats::{QueryCounters, QueryStats};
use crate::tasks::{spawn_cache_reaper_task, spawn_dedup_sweep_task, BackgroundTasks};

// == Query Cache ==
/// Answers queries from the cache, falling back to one deduplicated producer
/// execution per key on a miss.
///
/// Cloning is cheap; clones share the cache, the in-flight table and the
/// counters.
pub struct QueryCache<V> {
    cache: Arc<RwLock<TtlCache<V>>>,
    dedup: Deduplicator<V>,
    counters: Arc<QueryCounters>,
}

impl<V> Clone for QueryCache<V> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            dedup: self.dedup.clone(),
            counters: Arc::clone(&self.counters),
        }
    }
}

impl<V> QueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructors ==
    /// Creates a query cache from configuration.
    pub fn new(config: &Config) -> Self {
        Self::from_parts(
            TtlCache::new(config.max_entries, config.default_ttl()),
            Deduplicator::new(config.dedup_max_age()),
        )
    }

    /// Composes an existing cache and deduplicator.
    pub fn from_parts(cache: TtlCache<V>, dedup: Deduplicator<V>) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
            dedup,
            counters: Arc::new(QueryCounters::default()),
        }
    }

    pub fn cache(&self) -> &Arc<RwLock<TtlCache<V>>> {
        &self.cache
    }

    pub fn dedup(&self) -> &Deduplicator<V> {
        &self.dedup
    }

    // == Resolve ==
    /// Returns the cached value for `key`, or runs `producer` once for all
    /// concurrent callers and caches its result for `ttl` (cache default if
    /// None).
    ///
    /// The cache write happens inside the shared execution, before any
    /// caller receives the value. Failures are never cached.
    pub async fn resolve<F, Fut>(&self, key: &str, ttl: Option<Duration>, producer: F) -> Result<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        if let Some(value) = self.lookup(key).await? {
            return Ok(value);
        }

        let result = self.dedup.run(key, self.caching(key, ttl, producer)).await;
        self.record_outcome(key, &result);
        result
    }

    // == Resolve With Timeout ==
    /// Same as `resolve`, but this caller gives up after `timeout`.
    ///
    /// The shared execution continues and still populates the cache.
    pub async fn resolve_with_timeout<F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        producer: F,
        timeout: Duration,
    ) -> Result<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        if let Some(value) = self.lookup(key).await? {
            return Ok(value);
        }

        let result = self
            .dedup
            .run_with_timeout(key, self.caching(key, ttl, producer), timeout)
            .await;
        self.record_outcome(key, &result);
        result
    }

    async fn lookup(&self, key: &str) -> Result<Option<V>> {
        if key.is_empty() {
            return Err(QueryError::InvalidKey("query key cannot be empty".to_string()));
        }

        let cached = self.cache.write().await.get(key);
        match cached {
            Some(value) => {
                self.counters.record_hit();
                debug!(key = %sanitize_key(key), "Query cache hit");
                Ok(Some(value))
            }
            None => {
                self.counters.record_miss();
                debug!(key = %sanitize_key(key), "Query cache miss");
                Ok(None)
            }
        }
    }

    /// Wraps `producer` so a successful value is written to the cache as
    /// part of the single shared execution.
    fn caching<F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        producer: F,
    ) -> impl FnOnce() -> BoxFuture<'static, anyhow::Result<V>> + Send + 'static
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let cache = Arc::clone(&self.cache);
        let key = key.to_string();

        move || {
            async move {
                let value = producer().await?;
                cache.write().await.set(key, value.clone(), ttl)?;
                Ok::<_, anyhow::Error>(value)
            }
            .boxed()
        }
    }

    fn record_outcome(&self, key: &str, result: &Result<V>) {
        if let Err(err) = result {
            self.counters.record_error();
            debug!(key = %sanitize_key(key), error = %err, "Query failed");
        }
    }

    // == Invalidation ==
    /// Removes one cached entry; returns whether it existed.
    pub async fn invalidate(&self, key: &str) -> bool {
        self.cache.write().await.delete(key)
    }

    /// Removes every cached entry whose key matches `pattern`.
    pub async fn invalidate_pattern(&self, pattern: &str) -> Result<usize> {
        self.cache.write().await.invalidate_pattern(pattern)
    }

    // == Stats ==
    pub async fn stats(&self) -> QueryStats {
        let cache_stats = self.cache.read().await.stats();
        self.counters.snapshot(cache_stats, self.dedup.metrics())
    }

    // == Clear ==
    /// Empties the cache, drops in-flight records and resets every counter.
    pub async fn clear(&self) {
        self.cache.write().await.clear();
        self.dedup.clear();
        self.counters.reset();
    }

    // == Background Tasks ==
    /// Starts the stale in-flight sweep and the expired-entry reaper.
    pub fn start_background_tasks(&self, config: &Config) -> BackgroundTasks {
        BackgroundTasks {
            dedup_sweep: spawn_dedup_sweep_task(self.dedup.clone(), config.sweep_interval()),
            cache_reaper: spawn_cache_reaper_task(
                Arc::clone(&self.cache),
                config.cache_reap_interval(),
            ),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn query_cache() -> QueryCache<String> {
        QueryCache::new(&Config::default())
    }

    fn producer(
        counter: &Arc<AtomicUsize>,
        value: &str,
    ) -> impl FnOnce() -> BoxFuture<'static, anyhow::Result<String>> + Send + 'static {
        let counter = Arc::clone(counter);
        let value = value.to_string();
        move || {
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<_, anyhow::Error>(value)
            }
            .boxed()
        }
    }

    fn failing(
        counter: &Arc<AtomicUsize>,
    ) -> impl FnOnce() -> BoxFuture<'static, anyhow::Result<String>> + Send + 'static {
        let counter = Arc::clone(counter);
        move || {
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<String, _>(anyhow::anyhow!("query rejected"))
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_miss_then_hit() {
        let queries = query_cache();
        let counter = Arc::new(AtomicUsize::new(0));

        let first = queries.resolve("deals:open", None, producer(&counter, "v1")).await;
        let second = queries.resolve("deals:open", None, producer(&counter, "v2")).await;

        assert_eq!(first.unwrap(), "v1");
        assert_eq!(second.unwrap(), "v1");
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        let stats = queries.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.cache.sets, 1);
        // The hit never reached the deduplicator
        assert_eq!(stats.dedup.total_requests, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_written_before_result_delivered() {
        let queries = query_cache();
        let counter = Arc::new(AtomicUsize::new(0));

        queries
            .resolve("leads", None, producer(&counter, "rows"))
            .await
            .unwrap();

        assert!(queries.cache().read().await.contains_key("leads"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_share_one_producer() {
        let queries = query_cache();
        let counter = Arc::new(AtomicUsize::new(0));

        let results = futures::future::join_all(
            (0..5).map(|i| queries.resolve("report", None, producer(&counter, &format!("v{i}")))),
        )
        .await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        for result in results {
            assert_eq!(result.unwrap(), "v0");
        }
        let stats = queries.stats().await;
        assert_eq!(stats.dedup.deduplicated_requests, 4);
        assert_eq!(stats.cache.sets, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_not_cached() {
        let queries = query_cache();
        let counter = Arc::new(AtomicUsize::new(0));

        let first = queries.resolve("k", None, failing(&counter)).await;
        assert!(matches!(first, Err(QueryError::Producer(_))));
        assert!(!queries.cache().read().await.contains_key("k"));

        let second = queries.resolve("k", None, producer(&counter, "ok")).await;
        assert_eq!(second.unwrap(), "ok");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(queries.stats().await.errors, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_refetched() {
        let queries = query_cache();
        let counter = Arc::new(AtomicUsize::new(0));

        queries
            .resolve("k", Some(Duration::from_secs(5)), producer(&counter, "old"))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;

        let refreshed = queries
            .resolve("k", Some(Duration::from_secs(5)), producer(&counter, "new"))
            .await;

        assert_eq!(refreshed.unwrap(), "new");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_still_populates_cache() {
        let queries = query_cache();
        let counter = Arc::new(AtomicUsize::new(0));

        let result = queries
            .resolve_with_timeout("slow", None, producer(&counter, "late"), Duration::from_millis(10))
            .await;
        assert!(matches!(result, Err(QueryError::Timeout(_))));

        tokio::time::sleep(Duration::from_millis(100)).await;

        let cached = queries.cache().write().await.get("slow");
        assert_eq!(cached.as_deref(), Some("late"));
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let queries = query_cache();
        let counter = Arc::new(AtomicUsize::new(0));

        let result = queries.resolve("", None, producer(&counter, "v")).await;

        assert!(matches!(result, Err(QueryError::InvalidKey(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_and_clear() {
        let queries = query_cache();
        let counter = Arc::new(AtomicUsize::new(0));

        for key in ["user:1", "user:2", "org:1"] {
            queries.resolve(key, None, producer(&counter, key)).await.unwrap();
        }

        assert!(queries.invalidate("org:1").await);
        assert!(!queries.invalidate("org:1").await);
        assert_eq!(queries.invalidate_pattern("^user:").await.unwrap(), 2);
        assert!(matches!(
            queries.invalidate_pattern("[").await,
            Err(QueryError::InvalidPattern(_))
        ));

        queries.clear().await;
        let stats = queries.stats().await;
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.cache.sets, 0);
        assert_eq!(stats.dedup.total_requests, 0);
    }
}
