//! Callbacks invoked on session transitions.

use std::time::Duration;

use bankim_types::{SharedPurgeable, SharedStore};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::error::Result;

/// Login view the default handler redirects to.
pub const LOGIN_PATH: &str = "/login";

/// Reason attached to timeout redirects.
pub const TIMEOUT_REASON: &str = "timeout";

/// Receives session transitions.
///
/// Handlers run on the manager's task and must not block. A failing
/// [`on_timeout`](Self::on_timeout) is logged; the session is expired
/// regardless.
pub trait SessionHandler: Send + Sync {
    /// The session became idle for the warning threshold.
    fn on_warning(&self, remaining: Duration) {
        let _ = remaining;
    }

    /// Activity arrived while the warning was shown.
    fn on_warning_dismissed(&self) {}

    /// The session timed out.
    fn on_timeout(&self) -> Result<()>;
}

/// UI-facing notice published by [`DefaultSessionHandler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    /// Show a dismissible notice that stays until dismissed or replaced.
    Warning { remaining: Duration },
    /// Hide the warning notice.
    WarningDismissed,
    /// Navigate away from the authenticated area.
    Redirect { path: String, reason: String },
}

/// Handler that clears local state and redirects to login on timeout.
///
/// On timeout it purges every registered [`Purgeable`](bankim_types::Purgeable)
/// (caches), clears the persisted store and then publishes a
/// [`SessionNotice::Redirect`]. The redirect is published even if clearing
/// the store fails.
pub struct DefaultSessionHandler {
    store: Option<SharedStore>,
    purgeables: Vec<SharedPurgeable>,
    notices: broadcast::Sender<SessionNotice>,
    login_path: String,
}

impl DefaultSessionHandler {
    pub fn new() -> Self {
        let (notices, _) = broadcast::channel(16);
        Self {
            store: None,
            purgeables: Vec::new(),
            notices,
            login_path: LOGIN_PATH.to_string(),
        }
    }

    /// Clear `store` on timeout.
    pub fn with_store(mut self, store: SharedStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Purge `target` on timeout.
    pub fn with_purgeable(mut self, target: SharedPurgeable) -> Self {
        self.purgeables.push(target);
        self
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Subscribe to UI notices.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionNotice> {
        self.notices.subscribe()
    }

    fn publish(&self, notice: SessionNotice) {
        // No subscribers is fine
        let _ = self.notices.send(notice);
    }
}

impl Default for DefaultSessionHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHandler for DefaultSessionHandler {
    fn on_warning(&self, remaining: Duration) {
        self.publish(SessionNotice::Warning { remaining });
    }

    fn on_warning_dismissed(&self) {
        self.publish(SessionNotice::WarningDismissed);
    }

    fn on_timeout(&self) -> Result<()> {
        for target in &self.purgeables {
            debug!(purgeable = target.purge_name(), "Purging on session timeout");
            target.purge();
        }

        let cleared: Result<()> = match &self.store {
            Some(store) => store.clear().map_err(Into::into),
            None => Ok(()),
        };

        info!(path = %self.login_path, "Redirecting after session timeout");
        self.publish(SessionNotice::Redirect {
            path: self.login_path.clone(),
            reason: TIMEOUT_REASON.to_string(),
        });
        cleared
    }
}
