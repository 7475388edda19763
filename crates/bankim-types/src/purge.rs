//! Purge targets cleared when an authenticated session ends.

use std::sync::Arc;

/// Something holding user-scoped state that must be dropped on session end.
///
/// The session manager's default timeout handler calls [`Purgeable::purge`]
/// on every registered target before redirecting to the login view.
pub trait Purgeable: Send + Sync {
    /// Human-readable name used in logs.
    fn purge_name(&self) -> &str;

    /// Drop all held state. Must not panic.
    fn purge(&self);
}

/// Shared purge target.
pub type SharedPurgeable = Arc<dyn Purgeable>;
