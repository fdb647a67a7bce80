//! Compute-or-fetch caching with single-flight and tag invalidation.
//!
//! [`ResponseCache`] is the contract the data service depends on. Bodies are
//! stored as JSON strings so any key/value substrate can back it;
//! [`CacheStore`] is the in-process adapter. [`get_cached`] is the typed
//! entry point.
//!
//! Concurrent calls for the same key with no fresh entry share one
//! in-flight computation: every caller receives the same body or the same
//! [`CacheError`]. Failed computations are never stored.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

/// Defines how a single call interacts with cached entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheMode {
    /// Read from the cache if a non-expired entry is present;
    /// otherwise compute and write the result to the cache. (Default)
    #[default]
    Use,
    /// Always compute, bypassing any cached entry,
    /// and write the new result to the cache.
    Refresh,
    /// Always compute and do not read from or write to the cache.
    Bypass,
}

/// Key, tags and revalidation window for one cached computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOptions {
    pub key: String,
    pub tags: Vec<String>,
    /// Time-to-live of the stored entry. `None` uses the store default.
    pub revalidate: Option<Duration>,
    pub mode: CacheMode,
}

impl CacheOptions {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            tags: Vec::new(),
            revalidate: None,
            mode: CacheMode::Use,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_revalidate(mut self, revalidate: Duration) -> Self {
        self.revalidate = Some(revalidate);
        self
    }

    pub fn with_mode(mut self, mode: CacheMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Failure surfaced by [`ResponseCache::get_or_compute`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("computation for cache key '{key}' failed: {message}")]
    Compute { key: String, message: String },

    #[error("cache body for key '{key}' is not valid JSON for the requested type: {message}")]
    Serialization { key: String, message: String },
}

impl CacheError {
    pub fn compute(key: &str, error: impl Display) -> Self {
        Self::Compute {
            key: key.to_owned(),
            message: error.to_string(),
        }
    }

    pub fn serialization(key: &str, error: impl Display) -> Self {
        Self::Serialization {
            key: key.to_owned(),
            message: error.to_string(),
        }
    }

    /// Underlying failure message without the key prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Compute { message, .. } | Self::Serialization { message, .. } => message,
        }
    }
}

/// Boxed computation producing a serialized body.
pub type ComputeFuture = Pin<Box<dyn Future<Output = Result<String, CacheError>> + Send + 'static>>;

/// Deferred computation handed to the cache; invoked at most once per call.
pub type ComputeFn = Box<dyn FnOnce() -> ComputeFuture + Send + 'static>;

/// Compute-or-fetch contract required by the data service.
///
/// Implementations must collapse concurrent misses for the same key into
/// one computation and must not store failed computations.
pub trait ResponseCache: Send + Sync {
    /// Returns the fresh body stored under `options.key`, or runs `compute`,
    /// stores its body with the given tags and TTL, and returns it.
    fn get_or_compute<'a>(
        &'a self,
        options: CacheOptions,
        compute: ComputeFn,
    ) -> Pin<Box<dyn Future<Output = Result<String, CacheError>> + Send + 'a>>;

    /// Expires every entry carrying `tag`. Returns the number of entries affected.
    ///
    /// Computations already in flight are not cancelled and may still store
    /// their result.
    fn invalidate<'a>(&'a self, tag: &'a str) -> Pin<Box<dyn Future<Output = usize> + Send + 'a>>;
}

/// Typed compute-or-fetch through any [`ResponseCache`].
///
/// The value is round-tripped through JSON, so a cache hit yields the same
/// value the original computation produced.
pub async fn get_cached<T, F, Fut, E>(
    cache: &dyn ResponseCache,
    options: CacheOptions,
    compute: F,
) -> Result<T, CacheError>
where
    T: Serialize + DeserializeOwned + Send + 'static,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let key = options.key.clone();
    let compute_key = key.clone();
    let compute: ComputeFn = Box::new(move || {
        Box::pin(async move {
            let value = compute()
                .await
                .map_err(|error| CacheError::compute(&compute_key, error))?;
            serde_json::to_string(&value)
                .map_err(|error| CacheError::serialization(&compute_key, error))
        })
    });

    let body = cache.get_or_compute(options, compute).await?;
    serde_json::from_str(&body).map_err(|error| CacheError::serialization(&key, error))
}

type SharedCompute = Shared<BoxFuture<'static, Result<String, CacheError>>>;

#[derive(Debug, Clone)]
struct CacheEntry {
    body: String,
    expires_at: Instant,
    tags: BTreeSet<String>,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

struct InFlight {
    id: u64,
    future: SharedCompute,
}

struct CacheInner {
    map: HashMap<String, CacheEntry>,
    in_flight: HashMap<String, InFlight>,
    default_ttl: Duration,
    next_flight_id: u64,
}

impl CacheInner {
    fn new(default_ttl: Duration) -> Self {
        Self {
            map: HashMap::new(),
            in_flight: HashMap::new(),
            default_ttl,
            next_flight_id: 0,
        }
    }

    fn is_disabled(&self) -> bool {
        self.default_ttl == Duration::ZERO
    }

    fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        self.map
            .get(key)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.body.clone())
    }

    fn put(&mut self, key: String, body: String, ttl: Duration, tags: BTreeSet<String>) {
        if self.is_disabled() || ttl == Duration::ZERO {
            return;
        }
        // Purge on write so a long-lived store only holds fresh entries.
        self.clear_expired();
        let expires_at = Instant::now() + ttl;
        self.map.insert(
            key,
            CacheEntry {
                body,
                expires_at,
                tags,
            },
        );
    }

    fn invalidate(&mut self, tag: &str) -> usize {
        let now = Instant::now();
        let mut count = 0;
        for entry in self.map.values_mut() {
            if entry.tags.contains(tag) && entry.is_fresh(now) {
                entry.expires_at = now;
                count += 1;
            }
        }
        count
    }

    fn clear_expired(&mut self) {
        let now = Instant::now();
        self.map.retain(|_, entry| entry.is_fresh(now));
    }
}

/// Thread-safe in-memory [`ResponseCache`] with per-key single-flight.
#[derive(Clone)]
pub struct CacheStore {
    inner: Arc<RwLock<CacheInner>>,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore").finish_non_exhaustive()
    }
}

impl CacheStore {
    /// Create a new cache store with a default TTL.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner::new(default_ttl))),
        }
    }

    /// Create a cache store with a default TTL of 5 minutes.
    pub fn with_default_ttl() -> Self {
        Self::new(Duration::from_secs(300))
    }

    /// Create a disabled cache: nothing is stored, concurrent calls still share a computation.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Get a cached body if it exists and hasn't expired.
    pub async fn get(&self, key: &str) -> Option<String> {
        let store = self.inner.read().await;
        store.get(key)
    }

    /// Remove expired entries from the cache.
    pub async fn clear_expired(&self) {
        let mut store = self.inner.write().await;
        store.clear_expired();
    }

    /// Clear all entries from the cache.
    pub async fn clear(&self) {
        let mut store = self.inner.write().await;
        store.map.clear();
    }

    /// Get the number of entries in the cache (including expired entries).
    pub async fn len(&self) -> usize {
        let store = self.inner.read().await;
        store.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of computations currently in flight.
    pub async fn in_flight(&self) -> usize {
        let store = self.inner.read().await;
        store.in_flight.len()
    }

    /// Check if the cache is disabled (TTL is ZERO).
    pub async fn is_disabled(&self) -> bool {
        let store = self.inner.read().await;
        store.is_disabled()
    }

    async fn fetch(&self, options: CacheOptions, compute: ComputeFn) -> Result<String, CacheError> {
        if options.mode == CacheMode::Bypass {
            debug!(key = %options.key, "cache bypass");
            return compute().await;
        }

        if options.mode == CacheMode::Use {
            if let Some(body) = self.get(&options.key).await {
                debug!(key = %options.key, "cache hit");
                return Ok(body);
            }
        }

        let shared = {
            let mut store = self.inner.write().await;

            // Another caller may have stored the entry while we waited for the lock.
            if options.mode == CacheMode::Use {
                if let Some(body) = store.get(&options.key) {
                    debug!(key = %options.key, "cache hit");
                    return Ok(body);
                }
            }

            if let Some(flight) = store.in_flight.get(&options.key) {
                debug!(key = %options.key, "joining in-flight computation");
                flight.future.clone()
            } else {
                debug!(key = %options.key, "cache miss");
                let id = store.next_flight_id;
                store.next_flight_id = store.next_flight_id.wrapping_add(1);
                let ttl = options.revalidate.unwrap_or(store.default_ttl);
                let future = self.spawn_flight(id, &options, ttl, compute);
                store.in_flight.insert(
                    options.key.clone(),
                    InFlight {
                        id,
                        future: future.clone(),
                    },
                );
                future
            }
        };

        shared.await
    }

    fn spawn_flight(
        &self,
        id: u64,
        options: &CacheOptions,
        ttl: Duration,
        compute: ComputeFn,
    ) -> SharedCompute {
        let inner = Arc::clone(&self.inner);
        let key = options.key.clone();
        let tags = options.tags.iter().cloned().collect::<BTreeSet<_>>();

        async move {
            let result = compute().await;

            // Store and retire the flight together so readers never see a gap.
            let mut store = inner.write().await;
            if store.in_flight.get(&key).map(|flight| flight.id) == Some(id) {
                store.in_flight.remove(&key);
            }
            match &result {
                Ok(body) => store.put(key, body.clone(), ttl, tags),
                Err(error) => debug!(key = %key, %error, "computation failed; nothing stored"),
            }

            result
        }
        .boxed()
        .shared()
    }
}

impl ResponseCache for CacheStore {
    fn get_or_compute<'a>(
        &'a self,
        options: CacheOptions,
        compute: ComputeFn,
    ) -> Pin<Box<dyn Future<Output = Result<String, CacheError>> + Send + 'a>> {
        Box::pin(self.fetch(options, compute))
    }

    fn invalidate<'a>(&'a self, tag: &'a str) -> Pin<Box<dyn Future<Output = usize> + Send + 'a>> {
        Box::pin(async move {
            let mut store = self.inner.write().await;
            let count = store.invalidate(tag);
            debug!(tag, count, "invalidated cache entries");
            count
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_compute(counter: Arc<AtomicUsize>, body: &'static str) -> ComputeFn {
        Box::new(move || {
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(body.to_owned())
            })
        })
    }

    fn failing_compute(counter: Arc<AtomicUsize>) -> ComputeFn {
        Box::new(move || {
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(CacheError::compute("key1", "upstream down"))
            })
        })
    }

    #[tokio::test]
    async fn test_cache_hit_skips_compute() {
        let cache = CacheStore::new(Duration::from_secs(60));
        let counter = Arc::new(AtomicUsize::new(0));

        let first = cache
            .get_or_compute(CacheOptions::new("key1"), counting_compute(counter.clone(), "v1"))
            .await;
        let second = cache
            .get_or_compute(CacheOptions::new("key1"), counting_compute(counter.clone(), "v2"))
            .await;

        assert_eq!(first, Ok(String::from("v1")));
        assert_eq!(second, Ok(String::from("v1")));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get("key1").await, Some(String::from("v1")));
    }

    #[tokio::test]
    async fn test_cache_expiration_recomputes() {
        let cache = CacheStore::new(Duration::from_secs(60));
        let counter = Arc::new(AtomicUsize::new(0));
        let options = CacheOptions::new("key1").with_revalidate(Duration::from_millis(100));

        cache
            .get_or_compute(options.clone(), counting_compute(counter.clone(), "v1"))
            .await
            .expect("compute succeeds");
        tokio::time::sleep(Duration::from_millis(150)).await;
        let refreshed = cache
            .get_or_compute(options, counting_compute(counter.clone(), "v2"))
            .await;

        assert_eq!(refreshed, Ok(String::from("v2")));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_compute_is_not_cached() {
        let cache = CacheStore::new(Duration::from_secs(60));
        let counter = Arc::new(AtomicUsize::new(0));

        let failed = cache
            .get_or_compute(CacheOptions::new("key1"), failing_compute(counter.clone()))
            .await;
        assert!(matches!(failed, Err(CacheError::Compute { .. })));
        assert_eq!(cache.len().await, 0);
        assert_eq!(cache.in_flight().await, 0);

        let retried = cache
            .get_or_compute(CacheOptions::new("key1"), counting_compute(counter.clone(), "v1"))
            .await;
        assert_eq!(retried, Ok(String::from("v1")));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_by_tag() {
        let cache = CacheStore::new(Duration::from_secs(60));
        let counter = Arc::new(AtomicUsize::new(0));
        let tagged = CacheOptions::new("bars:AAPL").with_tag("ticker:AAPL");
        let other = CacheOptions::new("bars:MSFT").with_tag("ticker:MSFT");

        cache
            .get_or_compute(tagged.clone(), counting_compute(counter.clone(), "a"))
            .await
            .expect("compute succeeds");
        cache
            .get_or_compute(other.clone(), counting_compute(counter.clone(), "m"))
            .await
            .expect("compute succeeds");

        assert_eq!(cache.invalidate("ticker:AAPL").await, 1);
        assert!(cache.get("bars:AAPL").await.is_none());
        assert_eq!(cache.get("bars:MSFT").await, Some(String::from("m")));

        let recomputed = cache
            .get_or_compute(tagged, counting_compute(counter.clone(), "a2"))
            .await;
        assert_eq!(recomputed, Ok(String::from("a2")));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_refresh_and_bypass_modes() {
        let cache = CacheStore::new(Duration::from_secs(60));
        let counter = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_compute(CacheOptions::new("key1"), counting_compute(counter.clone(), "v1"))
            .await
            .expect("compute succeeds");

        let bypassed = cache
            .get_or_compute(
                CacheOptions::new("key1").with_mode(CacheMode::Bypass),
                counting_compute(counter.clone(), "v2"),
            )
            .await;
        assert_eq!(bypassed, Ok(String::from("v2")));
        assert_eq!(cache.get("key1").await, Some(String::from("v1")));

        let refreshed = cache
            .get_or_compute(
                CacheOptions::new("key1").with_mode(CacheMode::Refresh),
                counting_compute(counter.clone(), "v3"),
            )
            .await;
        assert_eq!(refreshed, Ok(String::from("v3")));
        assert_eq!(cache.get("key1").await, Some(String::from("v3")));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_clear_expired() {
        let cache = CacheStore::new(Duration::from_millis(100));
        let counter = Arc::new(AtomicUsize::new(0));

        for key in ["key1", "key2"] {
            cache
                .get_or_compute(CacheOptions::new(key), counting_compute(counter.clone(), "v"))
                .await
                .expect("compute succeeds");
        }
        assert_eq!(cache.len().await, 2);

        tokio::time::sleep(Duration::from_millis(150)).await;
        cache.clear_expired().await;

        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_insert_purges_expired_entries() {
        let cache = CacheStore::new(Duration::from_secs(60));
        let counter = Arc::new(AtomicUsize::new(0));
        cache
            .get_or_compute(
                CacheOptions::new("short").with_revalidate(Duration::from_millis(20)),
                counting_compute(counter.clone(), "v"),
            )
            .await
            .expect("compute succeeds");
        cache
            .get_or_compute(
                CacheOptions::new("tagged").with_tag("bars"),
                counting_compute(counter.clone(), "v"),
            )
            .await
            .expect("compute succeeds");
        assert_eq!(cache.invalidate("bars").await, 1);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.len().await, 2);

        cache
            .get_or_compute(CacheOptions::new("fresh"), counting_compute(counter.clone(), "v"))
            .await
            .expect("compute succeeds");

        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("fresh").await, Some(String::from("v")));
    }

    #[tokio::test]
    async fn test_cache_disabled() {
        let cache = CacheStore::disabled();
        let counter = Arc::new(AtomicUsize::new(0));

        assert!(cache.is_disabled().await);
        for _ in 0..2 {
            cache
                .get_or_compute(CacheOptions::new("key1"), counting_compute(counter.clone(), "v"))
                .await
                .expect("compute succeeds");
        }

        assert_eq!(cache.len().await, 0);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_get_cached_round_trips_typed_values() {
        let cache = CacheStore::with_default_ttl();

        let value: Vec<f64> = get_cached(&cache, CacheOptions::new("closes"), || async {
            Ok::<_, String>(vec![1.0, 2.5])
        })
        .await
        .expect("compute succeeds");
        assert_eq!(value, vec![1.0, 2.5]);

        let cached: Vec<f64> = get_cached(&cache, CacheOptions::new("closes"), || async {
            Err::<Vec<f64>, _>("must not run")
        })
        .await
        .expect("served from cache");
        assert_eq!(cached, vec![1.0, 2.5]);
    }

    #[tokio::test]
    async fn test_cache_mode_default() {
        let mode: CacheMode = Default::default();
        assert_eq!(mode, CacheMode::Use);
    }
}
