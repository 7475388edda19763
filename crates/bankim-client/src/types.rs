//! Data types returned by the client.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Fetch results
// ─────────────────────────────────────────────────────────────────────────────

/// Where a fetched value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// A real response from the server.
    Live,
    /// The caller-supplied fallback after retries ran out.
    Fallback,
}

/// A fetched value tagged with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub data: T,
    pub source: DataSource,
}

impl<T> Fetched<T> {
    pub fn live(data: T) -> Self {
        Self {
            data,
            source: DataSource::Live,
        }
    }

    pub fn fallback(data: T) -> Self {
        Self {
            data,
            source: DataSource::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == DataSource::Fallback
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        Fetched {
            data: f(self.data),
            source: self.source,
        }
    }

    pub fn into_inner(self) -> T {
        self.data
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Languages
// ─────────────────────────────────────────────────────────────────────────────

/// UI languages served by the content API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    He,
    #[default]
    En,
    Ru,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::He => "he",
            Language::En => "en",
            Language::Ru => "ru",
        }
    }

    pub fn is_rtl(&self) -> bool {
        matches!(self, Language::He)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept locale tags like "en-US"
        let primary = s.split(['-', '_']).next().unwrap_or(s);
        match primary.to_ascii_lowercase().as_str() {
            "he" | "iw" => Ok(Language::He),
            "en" => Ok(Language::En),
            "ru" => Ok(Language::Ru),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dropdowns
// ─────────────────────────────────────────────────────────────────────────────

/// One selectable option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownOption {
    pub value: String,
    pub label: String,
}

/// A dropdown declared on a screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownInfo {
    pub key: String,
    pub label: String,
}

/// Server-side cache diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheInfo {
    pub hit: bool,
    pub processing_time_ms: f64,
}

/// All dropdown content for one screen in one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropdownResponse {
    pub status: String,
    pub screen_location: String,
    pub language_code: String,
    #[serde(default)]
    pub dropdowns: Vec<DropdownInfo>,
    #[serde(default)]
    pub options: HashMap<String, Vec<DropdownOption>>,
    #[serde(default)]
    pub placeholders: HashMap<String, String>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_info: Option<CacheInfo>,
}

/// Options, placeholder and label resolved for one form field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropdownField {
    pub options: Vec<DropdownOption>,
    pub placeholder: Option<String>,
    pub label: Option<String>,
}

impl DropdownField {
    fn is_complete(&self) -> bool {
        !self.options.is_empty() && (self.placeholder.is_some() || self.label.is_some())
    }
}

/// Alternate field names used by older content rows.
const FIELD_SYNONYMS: &[(&str, &[&str])] = &[
    ("when_needed", &["when"]),
    ("when", &["when_needed"]),
    ("first_home", &["first"]),
    ("first", &["first_home"]),
];

impl DropdownResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// Resolve a single field of `screen`.
    ///
    /// Looks up `{screen}_{field}` for options, `{screen}_{field}_ph` then
    /// `{screen}_{field}` for the placeholder and `{screen}_{field}_label`
    /// then `{screen}_{field}` for the label. Missing pieces are filled from
    /// synonym field names.
    pub fn field(&self, screen: &str, field: &str) -> DropdownField {
        let mut resolved = self.lookup(&format!("{screen}_{field}"));
        if resolved.is_complete() {
            return resolved;
        }

        let synonyms = FIELD_SYNONYMS
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, alts)| *alts)
            .unwrap_or_default();

        for alt in synonyms {
            let alt = self.lookup(&format!("{screen}_{alt}"));
            if resolved.options.is_empty() {
                resolved.options = alt.options;
            }
            if resolved.placeholder.is_none() {
                resolved.placeholder = alt.placeholder;
            }
            if resolved.label.is_none() {
                resolved.label = alt.label;
            }
            if resolved.is_complete() {
                break;
            }
        }
        resolved
    }

    fn lookup(&self, key: &str) -> DropdownField {
        let text = |map: &HashMap<String, String>, suffixed: &str| {
            [suffixed, key]
                .into_iter()
                .filter_map(|k| map.get(k))
                .find(|s| !s.is_empty())
                .cloned()
        };
        DropdownField {
            options: self.options.get(key).cloned().unwrap_or_default(),
            placeholder: text(&self.placeholders, &format!("{key}_ph")),
            label: text(&self.labels, &format!("{key}_label")),
        }
    }
}
