//! Per-category debounce delays.

use std::fmt;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

use bankim_types::HasDebounceConfig;
use bankim_types::config_defaults as defaults;

use crate::{Debounced, KeyedDebounced};

/// Kind of user interaction being debounced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebounceCategory {
    /// Free-text search boxes.
    Search,
    /// Field validation while typing.
    Validation,
    /// Loan and payment recalculation.
    Calculation,
    /// City/bank/profession autocomplete.
    Autocomplete,
    /// Persisting form progress.
    Save,
}

impl DebounceCategory {
    pub const ALL: [DebounceCategory; 5] = [
        Self::Search,
        Self::Validation,
        Self::Calculation,
        Self::Autocomplete,
        Self::Save,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Validation => "validation",
            Self::Calculation => "calculation",
            Self::Autocomplete => "autocomplete",
            Self::Save => "save",
        }
    }
}

impl fmt::Display for DebounceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delay table for each [`DebounceCategory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebouncePresets {
    pub search: Duration,
    pub validation: Duration,
    pub calculation: Duration,
    pub autocomplete: Duration,
    pub save: Duration,
}

impl Default for DebouncePresets {
    fn default() -> Self {
        Self {
            search: Duration::from_millis(defaults::SEARCH_DEBOUNCE_MS),
            validation: Duration::from_millis(defaults::VALIDATION_DEBOUNCE_MS),
            calculation: Duration::from_millis(defaults::CALCULATION_DEBOUNCE_MS),
            autocomplete: Duration::from_millis(defaults::AUTOCOMPLETE_DEBOUNCE_MS),
            save: Duration::from_millis(defaults::SAVE_DEBOUNCE_MS),
        }
    }
}

impl DebouncePresets {
    pub fn from_provider(provider: &impl HasDebounceConfig) -> Self {
        Self {
            search: provider.search(),
            validation: provider.validation(),
            calculation: provider.calculation(),
            autocomplete: provider.autocomplete(),
            save: provider.save(),
        }
    }

    pub fn delay(&self, category: DebounceCategory) -> Duration {
        match category {
            DebounceCategory::Search => self.search,
            DebounceCategory::Validation => self.validation,
            DebounceCategory::Calculation => self.calculation,
            DebounceCategory::Autocomplete => self.autocomplete,
            DebounceCategory::Save => self.save,
        }
    }

    /// Wrap `operation` with the delay configured for `category`.
    pub fn wrap_for<A, T, E, F, Fut>(
        &self,
        category: DebounceCategory,
        operation: F,
    ) -> Debounced<A, T, E>
    where
        A: Send + 'static,
        T: Clone + Send + 'static,
        E: Clone + Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Debounced::named(category.as_str(), operation, self.delay(category))
    }

    /// Like [`wrap_for`](Self::wrap_for), with one window per key.
    pub fn wrap_keyed_for<K, A, T, E, F, Fut>(
        &self,
        category: DebounceCategory,
        operation: F,
    ) -> KeyedDebounced<K, A, T, E>
    where
        K: Eq + Hash + Clone + Debug + Send + 'static,
        A: Send + 'static,
        T: Clone + Send + 'static,
        E: Clone + Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        KeyedDebounced::named(category.as_str(), operation, self.delay(category))
    }
}
