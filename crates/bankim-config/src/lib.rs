//! Configuration system for the bankim data-access layer.
//!
//! Provides TOML-based configuration for the resilience components:
//! - `[retry]` policy for the fetch client
//! - `[debounce]` delay presets per call category
//! - `[cache]` TTL/size defaults for dropdown-style data
//! - `[session]` idle warning and timeout thresholds
//! - `[client]` API endpoint settings
//!
//! Config file layering: XDG user config, then a project-local `bankim.toml`.
//! Each section implements the matching provider trait from `bankim-types`,
//! so component crates never depend on this crate directly.

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{LoadedConfig, load_config, load_config_file, xdg_config_dir};
pub use error::{ConfigError, Result};
pub use types::*;
