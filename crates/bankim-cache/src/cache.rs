//! TTL/LRU cache with a background expiry sweep.

use std::sync::{Arc, Weak};
use std::time::Duration;

use bankim_types::Purgeable;
use lru::LruCache;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace};

use crate::config::CacheConfig;

/// Callback invoked with every entry removed from the cache.
pub type EvictCallback<V> = Arc<dyn Fn(&str, &V) + Send + Sync>;

/// Entry stored in the cache.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub key: String,
    pub value: V,
    pub created_at: Instant,
    pub expires_at: Instant,
    pub access_count: u64,
    pub last_accessed_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(key: String, value: V, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            key,
            value,
            created_at: now,
            expires_at: now + ttl,
            access_count: 0,
            last_accessed_at: now,
        }
    }

    /// An entry is stale from the instant its TTL has fully elapsed.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Time left before the entry goes stale.
    pub fn time_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of resident entries (fresh or not yet swept).
    pub size: usize,
    /// Maximum capacity.
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    /// Entries removed to make room for new keys.
    pub evictions: u64,
    /// Entries removed because their TTL elapsed.
    pub expirations: u64,
}

/// Inner state protected by the mutex.
struct CacheInner<V> {
    /// Recency order doubles as `last_accessed_at` order: every access that
    /// bumps the timestamp also promotes the entry, so the LRU end is always
    /// the oldest access. Ties resolve to the entry touched first.
    lru: LruCache<String, CacheEntry<V>>,
    stats: CacheStats,
    destroyed: bool,
}

struct Shared<V> {
    inner: Mutex<CacheInner<V>>,
    config: CacheConfig,
    on_evict: Option<EvictCallback<V>>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl<V> Shared<V> {
    /// Invoke the eviction callback outside of the inner lock.
    fn notify(&self, removed: Vec<(String, V)>) {
        if let Some(callback) = &self.on_evict {
            for (key, value) in &removed {
                callback(key, value);
            }
        }
    }

    fn sweep(&self) -> usize {
        let now = Instant::now();
        let removed: Vec<(String, V)> = {
            let mut inner = self.inner.lock();
            let expired: Vec<String> = inner
                .lru
                .iter()
                .filter(|(_, entry)| entry.is_expired_at(now))
                .map(|(key, _)| key.clone())
                .collect();

            let mut removed = Vec::with_capacity(expired.len());
            for key in expired {
                if let Some(entry) = inner.lru.pop(&key) {
                    removed.push((key, entry.value));
                }
            }
            inner.stats.expirations += removed.len() as u64;
            removed
        };

        let count = removed.len();
        if count > 0 {
            debug!(cache = %self.config.name, count, "Swept expired entries");
        }
        self.notify(removed);
        count
    }
}

impl<V> Drop for Shared<V> {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.get_mut().take() {
            handle.abort();
        }
    }
}

/// Bounded key/value cache with per-entry TTL and LRU eviction.
///
/// This cache provides:
/// - lazy expiry on `get`/`has` combined with a periodic background sweep
/// - LRU eviction of the least recently accessed entry when full
/// - an eviction callback fired exactly once for every removed entry
///   (expiry, explicit delete, `clear`, LRU eviction)
///
/// All operations are synchronous and never fail. Values are handed out as
/// clones; the cache never exposes its entries by reference.
///
/// The sweep runs on the ambient tokio runtime and only holds a weak
/// reference to the cache, so it never keeps the host alive. When created
/// outside a runtime the cache falls back to lazy expiry only.
pub struct TtlCache<V> {
    shared: Arc<Shared<V>>,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache with no eviction callback.
    pub fn new(config: CacheConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a cache that reports every removed entry to `on_evict`.
    pub fn with_eviction_hook<F>(config: CacheConfig, on_evict: F) -> Self
    where
        F: Fn(&str, &V) + Send + Sync + 'static,
    {
        Self::build(config, Some(Arc::new(on_evict)))
    }

    fn build(config: CacheConfig, on_evict: Option<EvictCallback<V>>) -> Self {
        let config = config.normalized();
        let enable_cleanup = config.enable_cleanup_task;
        let interval = config.cleanup_interval;
        let capacity = config.max_entries;

        let shared = Arc::new(Shared {
            inner: Mutex::new(CacheInner {
                lru: LruCache::unbounded(),
                stats: CacheStats {
                    capacity,
                    ..CacheStats::default()
                },
                destroyed: false,
            }),
            config,
            on_evict,
            sweeper: Mutex::new(None),
        });

        if enable_cleanup {
            let handle = spawn_sweeper(Arc::downgrade(&shared), interval);
            if handle.is_none() {
                debug!(
                    cache = %shared.config.name,
                    "No tokio runtime available, expired entries are removed lazily"
                );
            }
            *shared.sweeper.lock() = handle;
        }

        Self { shared }
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.shared.config
    }

    /// Current number of resident entries, including ones not yet swept.
    pub fn len(&self) -> usize {
        self.shared.inner.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.inner.lock().lru.is_empty()
    }

    /// Insert or replace `key` using the configured TTL.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let ttl = self.shared.config.ttl;
        self.set_with_ttl(key, value, ttl);
    }

    /// Insert or replace `key` with an explicit TTL.
    ///
    /// When the cache is full and `key` is new, the least recently accessed
    /// entry is evicted first. Replacing an existing key does not count as
    /// an eviction.
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let ttl = ttl.max(Duration::from_millis(1));

        let evicted = {
            let mut inner = self.shared.inner.lock();
            let mut evicted = None;

            if !inner.lru.contains(&key) && inner.lru.len() >= self.shared.config.max_entries {
                if let Some((evicted_key, entry)) = inner.lru.pop_lru() {
                    debug!(
                        cache = %self.shared.config.name,
                        key = %evicted_key,
                        "Evicting least recently used entry to make room"
                    );
                    inner.stats.evictions += 1;
                    evicted = Some((evicted_key, entry.value));
                }
            }

            let entry = CacheEntry::new(key.clone(), value, ttl);
            inner.lru.put(key.clone(), entry);

            trace!(
                cache = %self.shared.config.name,
                key = %key,
                ttl_ms = ttl.as_millis() as u64,
                size = inner.lru.len(),
                "Entry stored"
            );
            evicted
        };

        if let Some(evicted) = evicted {
            self.shared.notify(vec![evicted]);
        }
    }

    /// Get a fresh value, updating its access statistics.
    ///
    /// A stale entry is removed as a side effect and reported as absent.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let expired = {
            let mut inner = self.shared.inner.lock();
            let stale = match inner.lru.peek(key) {
                None => {
                    inner.stats.misses += 1;
                    return None;
                }
                Some(entry) => entry.is_expired_at(now),
            };

            if stale {
                inner.stats.misses += 1;
                inner.stats.expirations += 1;
                inner.lru.pop(key).map(|entry| (key.to_string(), entry.value))
            } else {
                inner.stats.hits += 1;
                let entry = inner.lru.get_mut(key)?;
                entry.access_count += 1;
                entry.last_accessed_at = now;
                trace!(cache = %self.shared.config.name, key = %key, "Cache hit");
                return Some(entry.value.clone());
            }
        };

        debug!(cache = %self.shared.config.name, key = %key, "Entry expired on read");
        if let Some(expired) = expired {
            self.shared.notify(vec![expired]);
        }
        None
    }

    /// Check for a fresh value without touching access statistics or LRU order.
    pub fn has(&self, key: &str) -> bool {
        let now = Instant::now();
        let expired = {
            let mut inner = self.shared.inner.lock();
            match inner.lru.peek(key) {
                None => return false,
                Some(entry) if !entry.is_expired_at(now) => return true,
                Some(_) => {
                    inner.stats.expirations += 1;
                    inner.lru.pop(key).map(|entry| (key.to_string(), entry.value))
                }
            }
        };

        if let Some(expired) = expired {
            self.shared.notify(vec![expired]);
        }
        false
    }

    /// Snapshot of an entry's metadata without updating access statistics.
    ///
    /// Stale entries are reported as absent but left for the sweep.
    pub fn peek_entry(&self, key: &str) -> Option<CacheEntry<V>> {
        let now = Instant::now();
        let inner = self.shared.inner.lock();
        inner
            .lru
            .peek(key)
            .filter(|entry| !entry.is_expired_at(now))
            .cloned()
    }

    /// Remove an entry. Returns whether anything was removed.
    pub fn delete(&self, key: &str) -> bool {
        let removed = self.shared.inner.lock().lru.pop(key);
        match removed {
            Some(entry) => {
                debug!(cache = %self.shared.config.name, key = %key, "Entry deleted");
                self.shared.notify(vec![(key.to_string(), entry.value)]);
                true
            }
            None => false,
        }
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let removed: Vec<(String, V)> = {
            let mut inner = self.shared.inner.lock();
            let mut removed = Vec::with_capacity(inner.lru.len());
            while let Some((key, entry)) = inner.lru.pop_lru() {
                removed.push((key, entry.value));
            }
            removed
        };

        if !removed.is_empty() {
            debug!(cache = %self.shared.config.name, count = removed.len(), "Cache cleared");
        }
        self.shared.notify(removed);
    }

    /// Remove all expired entries and return how many were dropped.
    ///
    /// This is what the background sweep runs on every tick, but it can
    /// also be called manually.
    pub fn cleanup_expired(&self) -> usize {
        self.shared.sweep()
    }

    /// Stop the background sweep and clear all entries. Idempotent.
    pub fn destroy(&self) {
        {
            let mut inner = self.shared.inner.lock();
            if inner.destroyed {
                return;
            }
            inner.destroyed = true;
        }

        if let Some(handle) = self.shared.sweeper.lock().take() {
            handle.abort();
        }
        self.clear();
        debug!(cache = %self.shared.config.name, "Cache destroyed");
    }

    /// Whether `destroy` has been called.
    pub fn is_destroyed(&self) -> bool {
        self.shared.inner.lock().destroyed
    }

    /// Whether the background sweep is currently scheduled.
    pub fn is_sweeping(&self) -> bool {
        self.shared
            .sweeper
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.shared.inner.lock();
        CacheStats {
            size: inner.lru.len(),
            ..inner.stats.clone()
        }
    }
}

fn spawn_sweeper<V>(shared: Weak<Shared<V>>, interval: Duration) -> Option<JoinHandle<()>>
where
    V: Send + Sync + 'static,
{
    let runtime = tokio::runtime::Handle::try_current().ok()?;
    Some(runtime.spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            // The cache is gone once every handle has been dropped
            let Some(shared) = shared.upgrade() else {
                break;
            };
            shared.sweep();
        }
    }))
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<V> Purgeable for TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn purge_name(&self) -> &str {
        &self.shared.config.name
    }

    fn purge(&self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    type EvictLog = Arc<Mutex<Vec<(String, u32)>>>;

    fn config(max: usize, ttl_ms: u64) -> CacheConfig {
        CacheConfig::new("test")
            .with_max_entries(max)
            .with_ttl(Duration::from_millis(ttl_ms))
            .with_cleanup_interval(Duration::from_millis(1_000))
    }

    fn recording_cache(config: CacheConfig) -> (TtlCache<u32>, EvictLog) {
        let log: EvictLog = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let cache = TtlCache::with_eviction_hook(config, move |key: &str, value: &u32| {
            sink.lock().push((key.to_string(), *value));
        });
        (cache, log)
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_and_get() {
        let cache = TtlCache::new(config(10, 1_000));
        cache.set("mortgage_step1/en", 42u32);

        assert_eq!(cache.get("mortgage_step1/en"), Some(42));
        assert_eq!(cache.get("missing"), None);
        assert!(cache.has("mortgage_step1/en"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_boundary() {
        let cache = TtlCache::new(config(10, 100).with_cleanup_task(false));
        cache.set("k", 1u32);

        tokio::time::advance(Duration::from_millis(99)).await;
        assert_eq!(cache.get("k"), Some(1));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(cache.get("k"), None);
        // Lazy expiry removed it
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_updates_access_stats_has_does_not() {
        let cache = TtlCache::new(config(10, 1_000));
        cache.set("k", 1u32);

        sleep(Duration::from_millis(10)).await;
        assert!(cache.has("k"));
        let entry = cache.peek_entry("k").unwrap();
        assert_eq!(entry.access_count, 0);
        assert_eq!(entry.last_accessed_at, entry.created_at);

        cache.get("k");
        cache.get("k");
        let entry = cache.peek_entry("k").unwrap();
        assert_eq!(entry.access_count, 2);
        assert!(entry.last_accessed_at > entry.created_at);
        assert!(entry.expires_at > entry.created_at);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lru_eviction() {
        let (cache, log) = recording_cache(config(3, 10_000));

        for i in 1..=3u32 {
            cache.set(format!("k{i}"), i);
            sleep(Duration::from_millis(1)).await;
        }
        cache.set("k4", 4);

        assert_eq!(cache.len(), 3);
        assert!(!cache.has("k1"));
        assert!(cache.has("k2"));
        assert!(cache.has("k4"));
        assert_eq!(log.lock().as_slice(), &[("k1".to_string(), 1)]);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lru_access_updates_order() {
        let cache = TtlCache::new(config(3, 10_000));
        for i in 1..=3u32 {
            cache.set(format!("k{i}"), i);
            sleep(Duration::from_millis(1)).await;
        }

        // Reading k1 makes k2 the oldest access
        cache.get("k1");
        cache.set("k4", 4);

        assert!(cache.has("k1"));
        assert!(!cache.has("k2"));
        assert!(cache.has("k3"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_has_does_not_protect_from_eviction() {
        let cache = TtlCache::new(config(2, 10_000));
        cache.set("a", 1u32);
        cache.set("b", 2);
        assert!(cache.has("a"));

        cache.set("c", 3);
        assert!(!cache.has("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tie_break_is_insertion_order() {
        // Bulk insert without the clock moving: all share the same timestamp
        let cache = TtlCache::new(config(3, 10_000));
        cache.set("first", 1u32);
        cache.set("second", 2);
        cache.set("third", 3);

        cache.set("fourth", 4);
        assert!(!cache.has("first"));
        assert!(cache.has("second"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_replace_existing_key_does_not_evict() {
        let (cache, log) = recording_cache(config(2, 10_000));
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("a", 10);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(10));
        assert!(log.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_never_exceeded() {
        let cache = TtlCache::new(config(5, 10_000));
        for i in 0..50u32 {
            cache.set(format!("k{i}"), i);
            assert!(cache.len() <= 5);
        }
        assert_eq!(cache.stats().evictions, 45);
    }

    #[tokio::test(start_paused = true)]
    async fn test_eviction_callback_exactly_once_per_removal() {
        let (cache, log) = recording_cache(config(2, 100));

        cache.set("deleted", 1);
        assert!(cache.delete("deleted"));
        assert!(!cache.delete("deleted"));

        cache.set("expired", 2);
        sleep(Duration::from_millis(150)).await;
        assert_eq!(cache.get("expired"), None);
        assert_eq!(cache.get("expired"), None);

        cache.set("a", 3);
        cache.set("b", 4);
        cache.set("c", 5); // evicts "a"

        cache.clear();

        let mut removed: Vec<String> = log.lock().iter().map(|(k, _)| k.clone()).collect();
        removed.sort();
        assert_eq!(removed, vec!["a", "b", "c", "deleted", "expired"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_sweep_removes_unread_entries() {
        let (cache, log) = recording_cache(
            config(10, 100).with_cleanup_interval(Duration::from_millis(500)),
        );
        cache.set("a", 1);
        cache.set("b", 2);
        assert!(cache.is_sweeping());

        // Never read again; only the sweep can reclaim them
        sleep(Duration::from_millis(600)).await;

        assert_eq!(cache.len(), 0);
        assert_eq!(log.lock().len(), 2);
        assert_eq!(cache.stats().expirations, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_expired_manual() {
        let cache = TtlCache::new(config(10, 50).with_cleanup_task(false));
        cache.set("a", 1u32);
        cache.set_with_ttl("b", 2, Duration::from_secs(60));

        sleep(Duration::from_millis(100)).await;

        assert_eq!(cache.cleanup_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.has("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_destroy_is_idempotent() {
        let (cache, log) = recording_cache(config(10, 1_000));
        cache.set("a", 1);

        cache.destroy();
        cache.destroy();

        assert!(cache.is_destroyed());
        assert!(!cache.is_sweeping());
        assert!(cache.is_empty());
        assert_eq!(log.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_stops_when_cache_dropped() {
        let cache = TtlCache::<u32>::new(config(10, 100));
        let weak = Arc::downgrade(&cache.shared);
        drop(cache);

        sleep(Duration::from_secs(5)).await;
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_works_without_runtime() {
        let cache = TtlCache::new(config(10, 1_000));
        cache.set("a", 1u32);
        assert!(!cache.is_sweeping());
        assert_eq!(cache.get("a"), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_and_purge() {
        let cache = TtlCache::new(config(10, 1_000));
        cache.set("a", 1u32);
        cache.get("a");
        cache.get("nope");

        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.capacity, 10);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);

        let purgeable: &dyn Purgeable = &cache;
        assert_eq!(purgeable.purge_name(), "test");
        purgeable.purge();
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_limits_assigned_directly_are_clamped() {
        let config = CacheConfig {
            max_entries: 0,
            ttl: Duration::ZERO,
            cleanup_interval: Duration::ZERO,
            ..CacheConfig::new("raw")
        };
        let cache = TtlCache::new(config);
        assert_eq!(cache.config().max_entries, 1);

        cache.set("a", 1u32);
        cache.set("b", 2u32);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.stats().evictions, 1);
    }
}
