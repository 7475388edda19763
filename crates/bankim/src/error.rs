//! Facade error type.

use thiserror::Error;

/// Errors surfaced by [`DataLayer`](crate::DataLayer).
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] bankim_config::ConfigError),

    #[error(transparent)]
    Fetch(#[from] bankim_client::FetchError),

    #[error(transparent)]
    Session(#[from] bankim_session::SessionError),
}

pub type Result<T> = std::result::Result<T, Error>;
