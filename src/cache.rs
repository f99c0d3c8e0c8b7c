//! Session-scoped JSON document cache.
//!
//! Memoizes fetched documents under `(repository, path)` keys. The cache is
//! monotonic within a session: entries are only ever added, and the sole
//! invalidation is dropping the whole map via [`JsonCache::clear`]. Failed
//! fetches are not cached, so a later call retries the network.
//!
//! Concurrent misses for the same key are collapsed: a per-key flight lock
//! serializes them, and the losers re-check the map before fetching, so a
//! document is fetched at most once per session no matter how many tasks
//! ask for it at the same time.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tokio::sync::Mutex;

use crate::transport::Transport;

type CacheKey = (String, String);

/// Process-shared cache of fetched JSON documents.
pub struct JsonCache {
    transport: Arc<dyn Transport>,
    entries: RwLock<HashMap<CacheKey, Value>>,
    /// In-flight fetch locks, keyed like `entries`. An entry exists only
    /// while at least one fetch for that key is running.
    flights: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
}

impl JsonCache {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            entries: RwLock::new(HashMap::new()),
            flights: Mutex::new(HashMap::new()),
        }
    }

    /// Uncached fetch. Failures surface as `None`, never as an error.
    pub async fn fetch_json(&self, url: &str) -> Option<Value> {
        self.transport.get_json(url).await
    }

    /// Cached fetch: return the stored value for `(repo, path)` when
    /// present, otherwise fetch `url` and store the result on success.
    pub async fn fetch_json_cached(&self, repo: &str, path: &str, url: &str) -> Option<Value> {
        let key = (repo.to_string(), path.to_string());

        if let Some(hit) = self.get(&key) {
            tracing::debug!(repo, path, "cache hit");
            return Some(hit);
        }

        let lock = {
            let mut flights = self.flights.lock().await;
            flights
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _flight = lock.lock().await;

        // A concurrent fetch for this key may have landed while we waited.
        if let Some(hit) = self.get(&key) {
            tracing::debug!(repo, path, "cache hit after flight");
            return Some(hit);
        }

        let data = self.fetch_json(url).await;
        if let Some(ref value) = data {
            self.entries
                .write()
                .expect("cache lock poisoned")
                .insert(key.clone(), value.clone());
        }

        self.flights.lock().await.remove(&key);
        data
    }

    fn get(&self, key: &CacheKey) -> Option<Value> {
        self.entries
            .read()
            .expect("cache lock poisoned")
            .get(key)
            .cloned()
    }

    /// Number of cached documents.
    pub fn len(&self) -> usize {
        self.entries.read().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry. There is no partial invalidation.
    pub fn clear(&self) {
        self.entries.write().expect("cache lock poisoned").clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;

    /// Transport that counts calls and serves a fixed value, or fails.
    struct CountingTransport {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingTransport {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl Transport for CountingTransport {
        async fn get_json(&self, _url: &str) -> Option<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                None
            } else {
                Some(json!({ "ok": true }))
            }
        }
    }

    #[tokio::test]
    async fn test_second_call_served_from_cache() {
        let transport = Arc::new(CountingTransport::new(false));
        let cache = JsonCache::new(transport.clone());

        let first = cache.fetch_json_cached("db", "a.json", "http://x/a.json").await;
        let second = cache.fetch_json_cached("db", "a.json", "http://x/a.json").await;

        assert_eq!(first, second);
        assert!(first.is_some());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let transport = Arc::new(CountingTransport::new(true));
        let cache = JsonCache::new(transport.clone());

        assert!(cache.fetch_json_cached("db", "a.json", "http://x/a.json").await.is_none());
        assert!(cache.fetch_json_cached("db", "a.json", "http://x/a.json").await.is_none());

        // Both calls hit the network: a failure leaves nothing behind.
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_keys_are_repo_scoped() {
        let transport = Arc::new(CountingTransport::new(false));
        let cache = JsonCache::new(transport.clone());

        cache.fetch_json_cached("db", "a.json", "http://x/db/a.json").await;
        cache.fetch_json_cached("log", "a.json", "http://x/log/a.json").await;

        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_collapse_to_one_fetch() {
        let transport = Arc::new(CountingTransport::new(false));
        let cache = Arc::new(JsonCache::new(transport.clone()));

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let cache = cache.clone();
            tasks.spawn(async move {
                cache.fetch_json_cached("db", "a.json", "http://x/a.json").await
            });
        }
        while let Some(result) = tasks.join_next().await {
            assert!(result.unwrap().is_some());
        }

        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_clear_drops_everything() {
        let transport = Arc::new(CountingTransport::new(false));
        let cache = JsonCache::new(transport.clone());

        cache.fetch_json_cached("db", "a.json", "http://x/a.json").await;
        cache.clear();
        cache.fetch_json_cached("db", "a.json", "http://x/a.json").await;

        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }
}
