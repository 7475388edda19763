//! Main client implementation.

use std::sync::Arc;
use std::time::Duration;

use bankim_cache::TtlCache;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use url::Url;

use crate::api::DropdownsApi;
use crate::cached::CachedFetch;
use crate::error::{FetchError, Result};
use crate::retry::{self, RetryOptions, RetryPolicy};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
use crate::types::Fetched;

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Retrying fetch client.
///
/// Every request goes through the retry loop configured by the client's
/// [`RetryPolicy`]; per-call [`RetryOptions`] can override the attempt
/// budget, observe retries and supply a fallback payload.
///
/// # Example
///
/// ```no_run
/// use bankim_client::{FetchClient, HttpRequest, RetryOptions};
///
/// # async fn example() -> bankim_client::Result<()> {
/// let client = FetchClient::builder()
///     .base_url("http://localhost:8003")
///     .build()?;
///
/// let request = HttpRequest::get("api/v1/calculation-parameters");
/// let options = RetryOptions::new().fallback(serde_json::json!({"prime_rate": 6.0}));
/// let fetched: bankim_client::Fetched<serde_json::Value> =
///     client.fetch_json_with_fallback(&request, &options).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FetchClient {
    /// Inner shared state.
    inner: Arc<ClientInner>,
}

/// Inner client state (shared across clones).
struct ClientInner {
    transport: Arc<dyn HttpTransport>,
    policy: RetryPolicy,
}

impl std::fmt::Debug for FetchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchClient")
            .field("policy", &self.inner.policy)
            .finish_non_exhaustive()
    }
}

impl FetchClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client with default settings pointing to the local API.
    pub fn localhost() -> Result<Self> {
        Self::builder().base_url("http://127.0.0.1:8003").build()
    }

    /// Get the retry policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.inner.policy
    }

    /// Send `request` through the retry loop.
    pub async fn fetch_with_retry(
        &self,
        request: &HttpRequest,
        options: &RetryOptions,
    ) -> Result<Fetched<HttpResponse>> {
        retry::fetch_with_retry(
            self.inner.transport.as_ref(),
            &self.inner.policy,
            request,
            options,
        )
        .await
    }

    /// Send `request` through the retry loop and decode the JSON body.
    pub async fn fetch_json_with_fallback<T: DeserializeOwned>(
        &self,
        request: &HttpRequest,
        options: &RetryOptions,
    ) -> Result<Fetched<T>> {
        retry::fetch_json_with_fallback(
            self.inner.transport.as_ref(),
            &self.inner.policy,
            request,
            options,
        )
        .await
    }

    /// Bind a cache slot to this client.
    ///
    /// The returned fetcher serves a fresh value for `key` from `cache` when
    /// one exists and otherwise fetches, stores the result for `ttl` and
    /// returns it.
    pub fn create_cached_fetch<T>(
        &self,
        cache: TtlCache<Fetched<T>>,
        key: impl Into<String>,
        ttl: Duration,
    ) -> CachedFetch<T>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        CachedFetch::new(self.clone(), cache, key, ttl)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the dropdowns API.
    pub fn dropdowns(&self) -> DropdownsApi {
        DropdownsApi::new(self.clone())
    }
}

/// Builder for creating a [`FetchClient`].
pub struct ClientBuilder {
    base_url: Option<String>,
    auth_token: Option<String>,
    timeout: Duration,
    user_agent: Option<String>,
    policy: RetryPolicy,
    transport: Option<Arc<dyn HttpTransport>>,
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("policy", &self.policy)
            .field("custom_transport", &self.transport.is_some())
            .finish_non_exhaustive()
    }
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: None,
            auth_token: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
            policy: RetryPolicy::default(),
            transport: None,
        }
    }

    /// Set the base URL for the server.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the authentication token.
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Set the per-attempt request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Set the retry policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Use a custom transport instead of reqwest.
    ///
    /// Base URL, auth token, timeout and user agent are then ignored.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<FetchClient> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(build_reqwest_transport(
                self.base_url,
                self.auth_token,
                self.timeout,
                self.user_agent,
            )?),
        };

        Ok(FetchClient {
            inner: Arc::new(ClientInner {
                transport,
                policy: self.policy,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn build_reqwest_transport(
    base_url: Option<String>,
    auth_token: Option<String>,
    timeout: Duration,
    user_agent: Option<String>,
) -> Result<ReqwestTransport> {
    let base_url = base_url.ok_or_else(|| FetchError::Config("base_url is required".to_string()))?;

    // Parse and normalize base URL
    let mut base_url = Url::parse(&base_url)?;
    if !base_url.path().ends_with('/') {
        base_url.set_path(&format!("{}/", base_url.path()));
    }

    // Build default headers
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if let Some(token) = &auth_token {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| FetchError::Config("Invalid auth token".to_string()))?;
        headers.insert(AUTHORIZATION, value);
    }

    let user_agent =
        user_agent.unwrap_or_else(|| format!("bankim-client/{}", env!("CARGO_PKG_VERSION")));

    let http = reqwest::Client::builder()
        .default_headers(headers)
        .user_agent(user_agent)
        .build()?;

    Ok(ReqwestTransport::new(http, base_url, timeout))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_base_url() {
        let err = ClientBuilder::new().build().unwrap_err();
        assert!(matches!(err, FetchError::Config(_)));
    }

    #[test]
    fn test_builder_rejects_bad_url() {
        let err = ClientBuilder::new().base_url("not a url").build().unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }

    #[test]
    fn test_builder_normalizes_trailing_slash() {
        let transport = build_reqwest_transport(
            Some("http://localhost:8003/api".to_string()),
            None,
            DEFAULT_TIMEOUT,
            None,
        )
        .unwrap();
        assert_eq!(transport.base_url().as_str(), "http://localhost:8003/api/");
    }

    #[test]
    fn test_builder_rejects_invalid_token() {
        let err = ClientBuilder::new()
            .base_url("http://localhost:8003")
            .auth_token("bad\ntoken")
            .build()
            .unwrap_err();
        assert!(matches!(err, FetchError::Config(_)));
    }

    #[test]
    fn test_builder_keeps_policy() {
        let policy = RetryPolicy {
            max_retries: 5,
            ..RetryPolicy::default()
        };
        let client = FetchClient::builder()
            .base_url("http://localhost:8003")
            .retry_policy(policy.clone())
            .build()
            .unwrap();
        assert_eq!(client.policy(), &policy);
    }
}
