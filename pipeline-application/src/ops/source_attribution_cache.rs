use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::{Mutex, OnceCell};
use tokio::time::timeout;
use tracing::{debug, warn};

use pipeline_domain::ports::SourceNameFetcher;

use crate::Metrics;

/// Process-wide memo of source URL -> attribution name.
///
/// Concurrent lookups of the same URL share one in-flight fetch. Only
/// successful lookups are kept; a failed URL is fetched again the next time
/// it is seen. Entries are never evicted.
///
/// `fetch_timeout` bounds the whole call, including time spent waiting on
/// another caller's fetch, so no lookup outlives it.
pub struct SourceAttributionCache {
    fetcher: Arc<dyn SourceNameFetcher>,
    fetch_timeout: Duration,
    metrics: Arc<Metrics>,
    entries: Mutex<HashMap<String, Arc<OnceCell<String>>>>,
}

impl SourceAttributionCache {
    pub fn new(
        fetcher: Arc<dyn SourceNameFetcher>,
        fetch_timeout: Duration,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            fetcher,
            fetch_timeout,
            metrics,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Never fails: any fetch error or timeout yields `None`.
    pub async fn resolve(&self, url: &str) -> Option<String> {
        self.metrics.record_attribution_lookup();
        let cell = {
            let mut entries = self.entries.lock().await;
            entries
                .entry(url.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let lookup = cell.get_or_try_init(|| self.fetch(url));
        let err = match timeout(self.fetch_timeout, lookup).await {
            Ok(Ok(name)) => return Some(name.clone()),
            Ok(Err(err)) => err,
            Err(_) => anyhow!("timed out after {}ms", self.fetch_timeout.as_millis()),
        };
        self.metrics.record_attribution_failure();
        warn!(url = %url, error = %err, "source attribution lookup failed");
        None
    }

    /// Number of URLs with a cached name.
    pub async fn len(&self) -> usize {
        let entries = self.entries.lock().await;
        entries.values().filter(|cell| cell.initialized()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn fetch(&self, url: &str) -> anyhow::Result<String> {
        self.metrics.record_attribution_fetch();
        debug!(url = %url, "fetching source attribution");
        self.fetcher.fetch_name(url).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    struct CountingFetcher {
        calls: AtomicUsize,
        delay: Duration,
        fail_first: usize,
    }

    impl CountingFetcher {
        fn new(delay: Duration, fail_first: usize) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay,
                fail_first,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SourceNameFetcher for CountingFetcher {
        async fn fetch_name(&self, url: &str) -> anyhow::Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if call < self.fail_first {
                anyhow::bail!("upstream returned 503");
            }
            Ok(format!("name for {}", url))
        }
    }

    fn cache_with(
        fetcher: Arc<CountingFetcher>,
        fetch_timeout: Duration,
    ) -> SourceAttributionCache {
        SourceAttributionCache::new(fetcher, fetch_timeout, Arc::new(Metrics::default()))
    }

    #[tokio::test]
    async fn second_lookup_is_served_from_cache() {
        let fetcher = Arc::new(CountingFetcher::new(Duration::ZERO, 0));
        let cache = cache_with(fetcher.clone(), Duration::from_secs(1));

        let first = cache.resolve("http://fonts.example/a").await;
        let second = cache.resolve("http://fonts.example/a").await;

        assert_eq!(first.as_deref(), Some("name for http://fonts.example/a"));
        assert_eq!(first, second);
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn distinct_urls_are_fetched_separately() {
        let fetcher = Arc::new(CountingFetcher::new(Duration::ZERO, 0));
        let cache = cache_with(fetcher.clone(), Duration::from_secs(1));

        cache.resolve("http://fonts.example/a").await;
        cache.resolve("http://fonts.example/b").await;

        assert_eq!(fetcher.calls(), 2);
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let fetcher = Arc::new(CountingFetcher::new(Duration::ZERO, 1));
        let cache = cache_with(fetcher.clone(), Duration::from_secs(1));

        assert_eq!(cache.resolve("http://fonts.example/a").await, None);
        assert!(cache.is_empty().await);

        let retried = cache.resolve("http://fonts.example/a").await;
        assert_eq!(retried.as_deref(), Some("name for http://fonts.example/a"));
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn slow_fetch_times_out_to_none() {
        let fetcher = Arc::new(CountingFetcher::new(Duration::from_secs(5), 0));
        let cache = cache_with(fetcher.clone(), Duration::from_millis(20));

        let started = std::time::Instant::now();
        assert_eq!(cache.resolve("http://fonts.example/slow").await, None);
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn concurrent_lookups_share_one_fetch() {
        let fetcher = Arc::new(CountingFetcher::new(Duration::from_millis(50), 0));
        let cache = cache_with(fetcher.clone(), Duration::from_secs(1));

        let (first, second) = tokio::join!(
            cache.resolve("http://fonts.example/a"),
            cache.resolve("http://fonts.example/a")
        );

        assert_eq!(first, second);
        assert!(first.is_some());
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn waiting_callers_share_one_timeout_budget() {
        let fetcher = Arc::new(CountingFetcher::new(Duration::from_secs(30), 0));
        let cache = Arc::new(cache_with(fetcher.clone(), Duration::from_millis(100)));

        let started = std::time::Instant::now();
        let mut lookups = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let cache = cache.clone();
            lookups.spawn(async move { cache.resolve("http://down.example/x").await });
        }
        while let Some(resolved) = lookups.join_next().await {
            assert_eq!(resolved.expect("lookup task"), None);
        }

        assert!(started.elapsed() < Duration::from_millis(500));
        assert!(cache.is_empty().await);
    }
}
