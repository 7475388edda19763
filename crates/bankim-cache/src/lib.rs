//! Bounded TTL/LRU cache for localized configuration data.
//!
//! This crate provides the cache used for dropdown option lists, calculation
//! parameters and translated content:
//! - per-entry expiration, checked lazily on read
//! - a periodic background sweep so entries that are never re-read still go away
//! - LRU eviction once `max_entries` is reached
//! - an eviction callback fired exactly once per removed entry
//!
//! # Example
//!
//! ```rust,ignore
//! use bankim_cache::{CacheConfig, TtlCache};
//!
//! let config = CacheConfig::new("dropdowns")
//!     .with_max_entries(100)
//!     .with_ttl(Duration::from_secs(300));
//!
//! let cache: TtlCache<String> = TtlCache::new(config);
//! cache.set("mortgage_step1/en", payload);
//! ```

mod cache;
mod config;

pub use cache::{CacheEntry, CacheStats, EvictCallback, TtlCache};
pub use config::CacheConfig;
