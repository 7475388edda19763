//! Retry loop with exponential backoff and fallback payloads.

use std::sync::Arc;
use std::time::Duration;

use bankim_types::HasRetryConfig;
use bankim_types::config_defaults as defaults;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{FetchError, Result};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::types::Fetched;

/// Backoff schedule and attempt budget.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: defaults::MAX_RETRIES,
            base_delay: defaults::retry_delay(),
            multiplier: defaults::BACKOFF_MULTIPLIER,
            max_delay: defaults::max_retry_delay(),
        }
    }
}

impl RetryPolicy {
    pub fn from_provider(provider: &impl HasRetryConfig) -> Self {
        Self {
            max_retries: provider.max_retries(),
            base_delay: provider.retry_delay(),
            multiplier: provider.backoff_multiplier(),
            max_delay: provider.max_retry_delay(),
        }
    }

    /// Delay to wait before attempt number `attempt` (1-based).
    ///
    /// The first attempt is immediate. Attempt `n >= 2` waits
    /// `min(base_delay * multiplier^(n-1), max_delay)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let raw = self.base_delay.as_nanos() as f64 * self.multiplier.powi(exponent);
        let capped = raw.min(self.max_delay.as_nanos() as f64);
        if capped.is_finite() && capped >= 0.0 {
            Duration::from_nanos(capped.round() as u64)
        } else {
            self.max_delay
        }
    }
}

/// Why a retry is happening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryCause {
    /// The previous attempt got a 5xx response.
    Server { status: u16 },
    /// The previous attempt got no response at all.
    Transport { message: String },
}

impl From<&FetchError> for RetryCause {
    fn from(err: &FetchError) -> Self {
        match err {
            FetchError::Server { status, .. } => RetryCause::Server { status: *status },
            other => RetryCause::Transport {
                message: other.to_string(),
            },
        }
    }
}

/// Report handed to the retry observer before each retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryAttempt {
    /// The attempt about to be made (2 for the first retry).
    pub attempt_number: u32,
    pub delay_before: Duration,
    pub error: Option<RetryCause>,
}

pub type RetryObserver = Arc<dyn Fn(&RetryAttempt) + Send + Sync>;

/// Per-call overrides for [`fetch_with_retry`].
#[derive(Clone, Default)]
pub struct RetryOptions {
    /// Total attempts; the policy value is used when unset.
    pub max_retries: Option<u32>,
    pub on_retry: Option<RetryObserver>,
    /// Payload served once retries are exhausted.
    pub fallback_data: Option<serde_json::Value>,
}

impl std::fmt::Debug for RetryOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryOptions")
            .field("max_retries", &self.max_retries)
            .field("on_retry", &self.on_retry.is_some())
            .field("fallback_data", &self.fallback_data)
            .finish()
    }
}

impl RetryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_retries(mut self, attempts: u32) -> Self {
        self.max_retries = Some(attempts);
        self
    }

    pub fn on_retry(mut self, observer: impl Fn(&RetryAttempt) + Send + Sync + 'static) -> Self {
        self.on_retry = Some(Arc::new(observer));
        self
    }

    pub fn fallback(mut self, data: serde_json::Value) -> Self {
        self.fallback_data = Some(data);
        self
    }
}

/// Map a received response onto the retry classification.
fn classify(response: HttpResponse) -> Result<HttpResponse> {
    match response.status {
        500..=599 => Err(FetchError::Server {
            status: response.status,
            body: response.body,
        }),
        400..=499 => Err(FetchError::Client {
            status: response.status,
            body: response.body,
        }),
        _ => Ok(response),
    }
}

/// Send `request`, retrying retryable failures with exponential backoff.
///
/// Terminal errors (4xx, bad URL, ...) return immediately. Once the attempt
/// budget is spent the fallback payload is served as a synthetic 200
/// response tagged [`DataSource::Fallback`](crate::DataSource::Fallback); without one, the last
/// attempt's error is returned.
pub async fn fetch_with_retry(
    transport: &dyn HttpTransport,
    policy: &RetryPolicy,
    request: &HttpRequest,
    options: &RetryOptions,
) -> Result<Fetched<HttpResponse>> {
    let attempts = options.max_retries.unwrap_or(policy.max_retries).max(1);
    let mut attempt = 1;

    let last_error = loop {
        let err = match transport.send(request).await.and_then(classify) {
            Ok(response) => return Ok(Fetched::live(response)),
            Err(e) if e.is_terminal() => return Err(e),
            Err(e) => e,
        };

        if attempt >= attempts {
            break err;
        }
        attempt += 1;

        let delay = policy.delay_for(attempt);
        warn!(
            path = %request.path,
            attempt,
            max_attempts = attempts,
            backoff_ms = delay.as_millis() as u64,
            error = %err,
            "Request failed, retrying"
        );
        if let Some(observer) = &options.on_retry {
            observer(&RetryAttempt {
                attempt_number: attempt,
                delay_before: delay,
                error: Some(RetryCause::from(&err)),
            });
        }
        tokio::time::sleep(delay).await;
    };

    match &options.fallback_data {
        Some(fallback) => {
            warn!(
                path = %request.path,
                attempts,
                error = %last_error,
                "Retries exhausted, serving fallback data"
            );
            Ok(Fetched::fallback(HttpResponse::synthetic(fallback)))
        }
        None => Err(last_error),
    }
}

/// Like [`fetch_with_retry`], decoding the body as JSON.
///
/// A body that fails to decode is also grounds for serving the fallback.
/// Terminal errors are never masked by the fallback.
pub async fn fetch_json_with_fallback<T: DeserializeOwned>(
    transport: &dyn HttpTransport,
    policy: &RetryPolicy,
    request: &HttpRequest,
    options: &RetryOptions,
) -> Result<Fetched<T>> {
    let live_only = RetryOptions {
        fallback_data: None,
        ..options.clone()
    };

    let err = match fetch_with_retry(transport, policy, request, &live_only).await {
        Ok(fetched) => match fetched.data.json::<T>() {
            Ok(data) => return Ok(Fetched::live(data)),
            Err(e) => {
                debug!(path = %request.path, error = %e, "Response body failed to decode");
                e
            }
        },
        Err(e) if e.is_terminal() => return Err(e),
        Err(e) => e,
    };

    match &options.fallback_data {
        Some(fallback) => {
            warn!(path = %request.path, error = %err, "Serving fallback data");
            let data = serde_json::from_value(fallback.clone())?;
            Ok(Fetched::fallback(data))
        }
        None => Err(err),
    }
}
