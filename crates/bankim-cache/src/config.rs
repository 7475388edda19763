//! Configuration for the TTL/LRU cache.

use std::time::Duration;

use bankim_types::HasCacheConfig;
use bankim_types::config_defaults as defaults;

/// Configuration for a cache instance.
///
/// Immutable once handed to [`TtlCache::new`](crate::TtlCache::new).
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Name used in log fields.
    pub name: String,

    /// Maximum number of resident entries before LRU eviction.
    pub max_entries: usize,

    /// Default time-to-live applied by `set`.
    pub ttl: Duration,

    /// Whether to run the periodic sweep of expired entries.
    /// If false, expired entries are only removed when touched.
    pub enable_cleanup_task: bool,

    /// Interval for the sweep (if enabled).
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            name: "cache".to_string(),
            max_entries: defaults::CACHE_MAX_SIZE,
            ttl: defaults::cache_ttl(),
            enable_cleanup_task: true,
            cleanup_interval: defaults::cache_cleanup_interval(),
        }
    }
}

impl CacheConfig {
    /// Create a configuration with default limits.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Build from any cache config provider.
    pub fn from_provider(name: impl Into<String>, provider: &impl HasCacheConfig) -> Self {
        Self::new(name)
            .with_ttl(provider.ttl())
            .with_max_entries(provider.max_size())
            .with_cleanup_interval(provider.cleanup_interval())
    }

    /// Set the maximum number of entries. Zero is raised to one.
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max.max(1);
        self
    }

    /// Set the default TTL. A zero TTL is raised to one millisecond.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl.max(Duration::from_millis(1));
        self
    }

    /// Enable or disable the background sweep.
    pub fn with_cleanup_task(mut self, enabled: bool) -> Self {
        self.enable_cleanup_task = enabled;
        self
    }

    /// Set the sweep interval. A zero interval is raised to one millisecond.
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Apply the builder clamps to fields that were assigned directly.
    pub(crate) fn normalized(self) -> Self {
        let (max, ttl, interval) = (self.max_entries, self.ttl, self.cleanup_interval);
        self.with_max_entries(max)
            .with_ttl(ttl)
            .with_cleanup_interval(interval)
    }
}
