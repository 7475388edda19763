//! Session lifecycle management for authenticated users.
//!
//! An idle session first receives a warning and is then expired. User
//! activity, delivered through an injected [`ActivityHub`], resets both
//! deadlines. On expiry the [`SessionHandler`] clears locally persisted state
//! and redirects to the login view.
//!
//! # Example
//!
//! ```rust,ignore
//! use bankim_session::{ActivityHub, DefaultSessionHandler, SessionManager, SessionTimeoutConfig};
//!
//! let hub = ActivityHub::new();
//! let handler = Arc::new(DefaultSessionHandler::new().with_store(store));
//! let manager = SessionManager::start(SessionTimeoutConfig::default(), &hub, handler)?;
//!
//! // UI layer
//! hub.emit(ActivityKind::KeyPress);
//! ```

mod activity;
mod error;
mod handler;
mod manager;

pub use activity::ActivityHub;
pub use error::{Result, SessionError};
pub use handler::{DefaultSessionHandler, LOGIN_PATH, SessionHandler, SessionNotice, TIMEOUT_REASON};
pub use manager::{SessionManager, SessionState, SessionTimeoutConfig};
