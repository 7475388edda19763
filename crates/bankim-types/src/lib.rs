//! Shared boundary types for the bankim data-access layer.
//!
//! The resilience components (cache, debounce, fetch client, session manager)
//! never reach for ambient globals. Everything they consume from the
//! surrounding application is expressed here as a small contract:
//!
//! - configuration capabilities ([`HasRetryConfig`], [`HasCacheConfig`], ...)
//! - persisted storage ([`KeyValueStore`]) with an in-memory implementation
//! - user-activity events ([`ActivityEvent`])
//! - purge targets cleared when a session ends ([`Purgeable`])

pub mod activity;
pub mod config;
pub mod error;
pub mod purge;
pub mod storage;

pub use activity::{ActivityEvent, ActivityKind};
pub use config::{
    ConfigProvider, HasCacheConfig, HasDebounceConfig, HasRetryConfig, HasSessionTimeoutConfig,
    defaults as config_defaults,
};
pub use error::{StorageError, StorageResult};
pub use purge::{Purgeable, SharedPurgeable};
pub use storage::{KeyValueStore, MemoryStore, SharedStore};
