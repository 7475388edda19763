//! Configuration traits for decoupled config passing between crates.
//!
//! These traits allow components to depend on configuration capabilities without
//! requiring direct knowledge of the full configuration structure. Each trait
//! represents a specific configuration capability.

use std::time::Duration;

use crate::activity::ActivityKind;

/// Base trait for all configuration types.
///
/// Provides common functionality expected of all config types. Implementations
/// should be cheaply cloneable and thread-safe.
pub trait ConfigProvider: Clone + Send + Sync + 'static {}

/// Retry policy configuration for the fetch client.
pub trait HasRetryConfig: ConfigProvider {
    /// Total number of attempts before giving up (including the first).
    fn max_retries(&self) -> u32;

    /// Base delay used for the exponential backoff.
    fn retry_delay(&self) -> Duration;

    /// Growth factor applied per attempt.
    fn backoff_multiplier(&self) -> f64;

    /// Ceiling for any single backoff delay.
    fn max_retry_delay(&self) -> Duration;
}

/// Cache configuration for dropdown-style data.
pub trait HasCacheConfig: ConfigProvider {
    /// Time-to-live for cached entries.
    fn ttl(&self) -> Duration;

    /// Maximum number of resident entries before LRU eviction.
    fn max_size(&self) -> usize;

    /// Interval between background sweeps of expired entries.
    fn cleanup_interval(&self) -> Duration;
}

/// Debounce delay presets per call category.
pub trait HasDebounceConfig: ConfigProvider {
    fn search(&self) -> Duration;
    fn validation(&self) -> Duration;
    fn calculation(&self) -> Duration;
    fn autocomplete(&self) -> Duration;
    fn save(&self) -> Duration;
}

/// Idle-session timeout configuration.
pub trait HasSessionTimeoutConfig: ConfigProvider {
    /// Idle duration after which the user is warned.
    fn warning_time(&self) -> Duration;

    /// Idle duration after which the session is terminated.
    fn timeout_time(&self) -> Duration;

    /// Event kinds that count as activity.
    fn activity_events(&self) -> Vec<ActivityKind> {
        ActivityKind::DEFAULT_SET.to_vec()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Default implementations for common types
// ─────────────────────────────────────────────────────────────────────────────

/// Default configuration values.
pub mod defaults {
    use std::time::Duration;

    pub const MAX_RETRIES: u32 = 3;
    pub const RETRY_DELAY_MS: u64 = 1_000;
    pub const BACKOFF_MULTIPLIER: f64 = 2.0;
    pub const MAX_RETRY_DELAY_MS: u64 = 10_000;

    pub const SEARCH_DEBOUNCE_MS: u64 = 300;
    pub const VALIDATION_DEBOUNCE_MS: u64 = 500;
    pub const CALCULATION_DEBOUNCE_MS: u64 = 1_000;
    pub const AUTOCOMPLETE_DEBOUNCE_MS: u64 = 200;
    pub const SAVE_DEBOUNCE_MS: u64 = 2_000;

    /// Dropdown content changes rarely; five minutes keeps it fresh enough.
    pub const CACHE_TTL_MS: u64 = 5 * 60 * 1_000;
    pub const CACHE_MAX_SIZE: usize = 100;
    pub const CACHE_CLEANUP_INTERVAL_MS: u64 = 60 * 1_000;

    pub const SESSION_WARNING_MS: u64 = 25 * 60 * 1_000;
    pub const SESSION_TIMEOUT_MS: u64 = 30 * 60 * 1_000;

    pub fn retry_delay() -> Duration {
        Duration::from_millis(RETRY_DELAY_MS)
    }

    pub fn max_retry_delay() -> Duration {
        Duration::from_millis(MAX_RETRY_DELAY_MS)
    }

    pub fn cache_ttl() -> Duration {
        Duration::from_millis(CACHE_TTL_MS)
    }

    pub fn cache_cleanup_interval() -> Duration {
        Duration::from_millis(CACHE_CLEANUP_INTERVAL_MS)
    }

    pub fn session_warning() -> Duration {
        Duration::from_millis(SESSION_WARNING_MS)
    }

    pub fn session_timeout() -> Duration {
        Duration::from_millis(SESSION_TIMEOUT_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct KeyboardOnly;

    impl ConfigProvider for KeyboardOnly {}

    impl HasSessionTimeoutConfig for KeyboardOnly {
        fn warning_time(&self) -> Duration {
            Duration::from_secs(60)
        }

        fn timeout_time(&self) -> Duration {
            Duration::from_secs(120)
        }
    }

    #[test]
    fn test_default_durations() {
        assert_eq!(defaults::retry_delay(), Duration::from_secs(1));
        assert_eq!(defaults::max_retry_delay(), Duration::from_secs(10));
        assert_eq!(defaults::cache_ttl(), Duration::from_secs(300));
        assert_eq!(defaults::cache_cleanup_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_session_warning_precedes_timeout() {
        assert!(defaults::session_warning() < defaults::session_timeout());
    }

    #[test]
    fn test_activity_events_default_to_standard_set() {
        assert_eq!(KeyboardOnly.activity_events(), ActivityKind::DEFAULT_SET.to_vec());
    }
}
