//! Resilient data-access layer for the bankim loan calculator.
//!
//! Re-exports the component crates and wires them together:
//!
//! - [`cache`]: TTL/LRU cache
//! - [`debounce`]: trailing-edge debounce coordinator
//! - [`client`]: retrying fetch client with fallback payloads
//! - [`session`]: idle-session warning and expiry
//! - [`config`]: TOML configuration
//!
//! [`DataLayer`] composes them the way the UI uses them, and
//! [`telemetry::init`] installs the tracing subscriber.

mod data_layer;
mod error;
pub mod telemetry;

pub use bankim_cache as cache;
pub use bankim_client as client;
pub use bankim_config as config;
pub use bankim_debounce as debounce;
pub use bankim_session as session;
pub use bankim_types as types;

pub use data_layer::{DataLayer, DropdownLoader, DropdownOutcome};
pub use error::{Error, Result};
