//! Fetch error types.

use thiserror::Error;

/// Errors produced by the fetch client.
///
/// Errors fall into two classes: retryable (server 5xx and transport
/// failures) and terminal (everything else). Terminal errors are surfaced on
/// the first attempt and are never replaced by a fallback payload.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a response (connect, DNS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Transport failure reported by a non-reqwest transport.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Server returned a 5xx response.
    #[error("Server error ({status}): {body}")]
    Server { status: u16, body: String },

    /// Server returned a 4xx response.
    #[error("Client error ({status}): {body}")]
    Client { status: u16, body: String },

    /// The response body was not the expected JSON.
    #[error("JSON error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The payload was well-formed but reported a failure status.
    #[error("API error: {status}")]
    Api { status: String },

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FetchError {
    /// Whether another attempt may succeed.
    ///
    /// A reqwest error raised while building the request (such as an invalid
    /// header value) is terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Http(e) => !e.is_builder(),
            FetchError::Transport(_) | FetchError::Server { .. } => true,
            _ => false,
        }
    }

    /// Whether the error must surface immediately.
    pub fn is_terminal(&self) -> bool {
        !self.is_retryable()
    }

    /// HTTP status associated with the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Server { status, .. } | FetchError::Client { status, .. } => Some(*status),
            FetchError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        self.status() == Some(401)
    }
}

/// Result type for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let server = FetchError::Server {
            status: 503,
            body: String::new(),
        };
        assert!(server.is_retryable());
        assert_eq!(server.status(), Some(503));

        let client = FetchError::Client {
            status: 404,
            body: "missing".into(),
        };
        assert!(client.is_terminal());
        assert!(client.is_not_found());

        assert!(FetchError::Transport("connection reset".into()).is_retryable());
        assert!(FetchError::Api { status: "error".into() }.is_terminal());
    }

    #[test]
    fn test_request_build_errors_are_terminal() {
        let err = reqwest::Client::new()
            .get("http://localhost/api/dropdowns")
            .header("x-screen", "mortgage\nstep1")
            .build()
            .unwrap_err();
        assert!(err.is_builder());

        let err = FetchError::from(err);
        assert!(err.is_terminal());
        assert_eq!(err.status(), None);
    }
}
