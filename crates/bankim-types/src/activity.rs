//! User-activity events observed by the session lifecycle manager.

use serde::{Deserialize, Serialize};

/// Kind of user interaction that counts as "activity".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    PointerMove,
    PointerDown,
    KeyPress,
    Scroll,
    Touch,
}

impl ActivityKind {
    /// Event kinds monitored when no explicit set is configured.
    pub const DEFAULT_SET: [ActivityKind; 4] = [
        ActivityKind::PointerMove,
        ActivityKind::KeyPress,
        ActivityKind::Scroll,
        ActivityKind::Touch,
    ];

    /// Stable name used in logs and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::PointerMove => "pointer_move",
            ActivityKind::PointerDown => "pointer_down",
            ActivityKind::KeyPress => "key_press",
            ActivityKind::Scroll => "scroll",
            ActivityKind::Touch => "touch",
        }
    }
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single observed user interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityEvent {
    pub kind: ActivityKind,
}

impl ActivityEvent {
    pub fn new(kind: ActivityKind) -> Self {
        Self { kind }
    }
}

impl From<ActivityKind> for ActivityEvent {
    fn from(kind: ActivityKind) -> Self {
        Self::new(kind)
    }
}
