//! Tracing subscriber setup.
//!
//! Console output is human-readable and filtered by `RUST_LOG` (or the
//! verbosity default). An optional daily-rotated JSON file captures
//! everything down to `trace` for the bankim crates.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Crates whose events are raised by the verbosity switch.
const CRATES: &[&str] = &[
    "bankim",
    "bankim_cache",
    "bankim_client",
    "bankim_config",
    "bankim_debounce",
    "bankim_session",
];

/// Log file name inside the log directory.
const LOG_FILE: &str = "bankim.log";

#[derive(Debug, Clone, Default)]
pub struct TelemetryOptions {
    /// Debug-level console output for the bankim crates.
    pub verbose: bool,
    /// Directory for the rotating JSON log; `None` disables the file layer.
    pub log_dir: Option<PathBuf>,
}

impl TelemetryOptions {
    /// Log into `logs/` next to the user config, if one can be resolved.
    pub fn with_default_log_dir(mut self) -> Self {
        self.log_dir = bankim_config::xdg_config_dir().map(|d| d.join("logs"));
        self
    }
}

/// Filter directives for the bankim crates at `level`, with `fallback` for
/// everything else.
pub fn directives(level: &str, fallback: &str) -> String {
    let mut parts: Vec<String> = CRATES.iter().map(|c| format!("{c}={level}")).collect();
    parts.push(fallback.to_string());
    parts.join(",")
}

/// Install the global subscriber.
///
/// The returned guard flushes the file log when dropped; keep it alive for
/// the lifetime of the program.
pub fn init(options: &TelemetryOptions) -> anyhow::Result<Option<WorkerGuard>> {
    let console_filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(value) if !value.is_empty() => EnvFilter::try_new(value)?,
        _ if options.verbose => EnvFilter::new(directives("debug", "info")),
        _ => EnvFilter::new(directives("info", "warn")),
    };

    let console = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_filter(console_filter);

    let (file, guard) = match &options.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(EnvFilter::new(directives("trace", "info")));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()?;

    Ok(guard)
}
