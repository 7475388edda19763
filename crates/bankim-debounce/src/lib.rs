//! Trailing-edge debounce coordinator.
//!
//! Collapses bursts of calls to an async operation into a single execution
//! that runs once the caller has been quiet for the configured delay. Every
//! caller in the window receives the outcome of that one execution.
//!
//! ```rust,ignore
//! use bankim_debounce::{Debounced, DebounceOutcome};
//!
//! let search = Debounced::new(|query: String| async move { api.search(&query).await }, delay);
//! let first = search.call("mor".into());
//! let second = search.call("mortgage".into());
//! // Both resolve with the results for "mortgage"
//! ```
//!
//! All timers run on the ambient tokio runtime; `call` must be invoked from
//! within one.

mod debounce;
mod keyed;
mod outcome;
mod presets;

pub use debounce::Debounced;
pub use keyed::KeyedDebounced;
pub use outcome::DebounceOutcome;
pub use presets::{DebounceCategory, DebouncePresets};
