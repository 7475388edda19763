//! Retrying HTTP fetch client for the bankim content API.
//!
//! This crate provides:
//!
//! - **Retry loop**: bounded attempts with exponential backoff and a ceiling
//! - **Classification**: 5xx and transport failures are retried, 4xx are terminal
//! - **Fallback payloads**: served as [`DataSource::Fallback`] once retries run out
//! - **Cached fetches**: cache-aside fetches backed by [`bankim_cache::TtlCache`]
//! - **Dropdowns API**: typed access to `/api/dropdowns/{screen}/{lang}`
//!
//! # Example
//!
//! ```no_run
//! use bankim_client::{FetchClient, Language, Result};
//!
//! # async fn example() -> Result<()> {
//! let client = FetchClient::builder()
//!     .base_url("http://localhost:8003")
//!     .build()?;
//!
//! let dropdowns = client.dropdowns().fetch("mortgage_step1", Language::He).await?;
//! let when = dropdowns.field("mortgage_step1", "when_needed");
//! println!("{} options", when.options.len());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cached;
pub mod client;
pub mod error;
pub mod retry;
pub mod transport;
pub mod types;

pub use api::DropdownsApi;
pub use cached::CachedFetch;
pub use client::{ClientBuilder, FetchClient};
pub use error::{FetchError, Result};
pub use retry::{
    RetryAttempt, RetryCause, RetryObserver, RetryOptions, RetryPolicy, fetch_json_with_fallback,
    fetch_with_retry,
};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use types::*;
