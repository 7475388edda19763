//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [retry]       # fetch client retry policy
//! [debounce]    # delay presets per call category
//! [cache]       # dropdown cache TTL and size
//! [session]     # idle warning / timeout thresholds
//! [client]      # API endpoint
//! ```

use std::time::Duration;

use bankim_types::config_defaults as defaults;
use bankim_types::{
    ActivityKind, ConfigProvider, HasCacheConfig, HasDebounceConfig, HasRetryConfig,
    HasSessionTimeoutConfig,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged. Accessors fall back to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BankimConfig {
    pub retry: Option<RetryConfig>,
    pub debounce: Option<DebounceConfig>,
    pub cache: Option<CacheConfig>,
    pub session: Option<SessionConfig>,
    pub client: Option<ClientConfig>,
}

impl BankimConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Sections are replaced wholesale, not field by field.
    pub fn merge(&mut self, other: BankimConfig) {
        if other.retry.is_some() {
            self.retry = other.retry;
        }
        if other.debounce.is_some() {
            self.debounce = other.debounce;
        }
        if other.cache.is_some() {
            self.cache = other.cache;
        }
        if other.session.is_some() {
            self.session = other.session;
        }
        if other.client.is_some() {
            self.client = other.client;
        }
    }

    pub fn retry(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    pub fn debounce(&self) -> DebounceConfig {
        self.debounce.clone().unwrap_or_default()
    }

    pub fn cache(&self) -> CacheConfig {
        self.cache.clone().unwrap_or_default()
    }

    pub fn session(&self) -> SessionConfig {
        self.session.clone().unwrap_or_default()
    }

    pub fn client(&self) -> ClientConfig {
        self.client.clone().unwrap_or_default()
    }

    /// Check every section for out-of-range values.
    pub fn validate(&self) -> crate::Result<()> {
        self.retry().validate()?;
        self.cache().validate()?;
        self.session().validate()?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Retry Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Retry policy for the fetch client.
///
/// ```toml
/// [retry]
/// max_retries = 3
/// retry_delay_ms = 1000
/// backoff_multiplier = 2.0
/// max_retry_delay_ms = 10000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per request, including the first.
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub max_retry_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: defaults::MAX_RETRIES,
            retry_delay_ms: defaults::RETRY_DELAY_MS,
            backoff_multiplier: defaults::BACKOFF_MULTIPLIER,
            max_retry_delay_ms: defaults::MAX_RETRY_DELAY_MS,
        }
    }
}

impl RetryConfig {
    fn validate(&self) -> crate::Result<()> {
        if self.max_retries == 0 {
            return Err(ConfigError::invalid(
                "retry.max_retries",
                "at least one attempt is required",
            ));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(ConfigError::invalid(
                "retry.backoff_multiplier",
                format!("must be >= 1.0, got {}", self.backoff_multiplier),
            ));
        }
        if self.max_retry_delay_ms < self.retry_delay_ms {
            return Err(ConfigError::invalid(
                "retry.max_retry_delay_ms",
                "must not be smaller than retry_delay_ms",
            ));
        }
        Ok(())
    }
}

impl ConfigProvider for RetryConfig {}

impl HasRetryConfig for RetryConfig {
    fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    fn backoff_multiplier(&self) -> f64 {
        self.backoff_multiplier
    }

    fn max_retry_delay(&self) -> Duration {
        Duration::from_millis(self.max_retry_delay_ms)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Debounce Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Debounce delays per call category, in milliseconds.
///
/// ```toml
/// [debounce]
/// search_ms = 300
/// validation_ms = 500
/// calculation_ms = 1000
/// autocomplete_ms = 200
/// save_ms = 2000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    pub search_ms: u64,
    pub validation_ms: u64,
    pub calculation_ms: u64,
    pub autocomplete_ms: u64,
    pub save_ms: u64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            search_ms: defaults::SEARCH_DEBOUNCE_MS,
            validation_ms: defaults::VALIDATION_DEBOUNCE_MS,
            calculation_ms: defaults::CALCULATION_DEBOUNCE_MS,
            autocomplete_ms: defaults::AUTOCOMPLETE_DEBOUNCE_MS,
            save_ms: defaults::SAVE_DEBOUNCE_MS,
        }
    }
}

impl ConfigProvider for DebounceConfig {}

impl HasDebounceConfig for DebounceConfig {
    fn search(&self) -> Duration {
        Duration::from_millis(self.search_ms)
    }

    fn validation(&self) -> Duration {
        Duration::from_millis(self.validation_ms)
    }

    fn calculation(&self) -> Duration {
        Duration::from_millis(self.calculation_ms)
    }

    fn autocomplete(&self) -> Duration {
        Duration::from_millis(self.autocomplete_ms)
    }

    fn save(&self) -> Duration {
        Duration::from_millis(self.save_ms)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cache Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Cache settings for dropdown-style data.
///
/// ```toml
/// [cache]
/// ttl_ms = 300000
/// max_size = 100
/// cleanup_interval_ms = 60000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_ms: u64,
    pub max_size: usize,
    pub cleanup_interval_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: defaults::CACHE_TTL_MS,
            max_size: defaults::CACHE_MAX_SIZE,
            cleanup_interval_ms: defaults::CACHE_CLEANUP_INTERVAL_MS,
        }
    }
}

impl CacheConfig {
    fn validate(&self) -> crate::Result<()> {
        if self.ttl_ms == 0 {
            return Err(ConfigError::invalid("cache.ttl_ms", "must be > 0"));
        }
        if self.max_size == 0 {
            return Err(ConfigError::invalid("cache.max_size", "must be > 0"));
        }
        if self.cleanup_interval_ms == 0 {
            return Err(ConfigError::invalid(
                "cache.cleanup_interval_ms",
                "must be > 0",
            ));
        }
        Ok(())
    }
}

impl ConfigProvider for CacheConfig {}

impl HasCacheConfig for CacheConfig {
    fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    fn max_size(&self) -> usize {
        self.max_size
    }

    fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Idle-session thresholds.
///
/// ```toml
/// [session]
/// warning_time_ms = 1500000
/// timeout_time_ms = 1800000
/// activity_events = ["pointer_move", "key_press", "scroll", "touch"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub warning_time_ms: u64,
    pub timeout_time_ms: u64,
    /// Activity kinds that reset the idle timers.
    pub activity_events: Vec<ActivityKind>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            warning_time_ms: defaults::SESSION_WARNING_MS,
            timeout_time_ms: defaults::SESSION_TIMEOUT_MS,
            activity_events: ActivityKind::DEFAULT_SET.to_vec(),
        }
    }
}

impl SessionConfig {
    fn validate(&self) -> crate::Result<()> {
        if self.warning_time_ms == 0 {
            return Err(ConfigError::invalid("session.warning_time_ms", "must be > 0"));
        }
        if self.warning_time_ms >= self.timeout_time_ms {
            return Err(ConfigError::invalid(
                "session.warning_time_ms",
                format!(
                    "must be smaller than timeout_time_ms ({} >= {})",
                    self.warning_time_ms, self.timeout_time_ms
                ),
            ));
        }
        Ok(())
    }
}

impl ConfigProvider for SessionConfig {}

impl HasSessionTimeoutConfig for SessionConfig {
    fn warning_time(&self) -> Duration {
        Duration::from_millis(self.warning_time_ms)
    }

    fn timeout_time(&self) -> Duration {
        Duration::from_millis(self.timeout_time_ms)
    }

    fn activity_events(&self) -> Vec<ActivityKind> {
        self.activity_events.clone()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Client Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// API endpoint settings for the fetch client.
///
/// ```toml
/// [client]
/// base_url = "http://localhost:8003"
/// timeout_secs = 30
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Bearer token; prefer setting it at runtime after login.
    pub auth_token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8003".to_string(),
            timeout_secs: 30,
            auth_token: None,
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
