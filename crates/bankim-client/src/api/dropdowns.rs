//! Dropdowns API.

use tracing::debug;

use crate::client::FetchClient;
use crate::error::{FetchError, Result};
use crate::retry::RetryOptions;
use crate::transport::HttpRequest;
use crate::types::{DropdownResponse, Language};

/// Dropdowns API client.
///
/// Serves option lists, placeholders and labels for a wizard screen in one
/// language. Requests go through the client's retry loop.
pub struct DropdownsApi {
    client: FetchClient,
}

impl DropdownsApi {
    pub(crate) fn new(client: FetchClient) -> Self {
        Self { client }
    }

    /// Request for one screen's dropdown content.
    pub fn request(screen: &str, language: Language) -> HttpRequest {
        HttpRequest::get(format!("api/dropdowns/{}/{}", screen, language.code()))
    }

    /// Cache key used for one screen's dropdown content.
    pub fn cache_key(screen: &str, language: Language) -> String {
        format!("dropdown_{}_{}", screen, language.code())
    }

    /// Fetch dropdown content for `screen`.
    ///
    /// A payload whose `status` is not `"success"` is a terminal
    /// [`FetchError::Api`] error.
    pub async fn fetch(&self, screen: &str, language: Language) -> Result<DropdownResponse> {
        self.fetch_with(screen, language, &RetryOptions::default())
            .await
    }

    /// Like [`fetch`](Self::fetch) with per-call retry options.
    pub async fn fetch_with(
        &self,
        screen: &str,
        language: Language,
        options: &RetryOptions,
    ) -> Result<DropdownResponse> {
        let request = Self::request(screen, language);
        let fetched = self.client.fetch_with_retry(&request, options).await?;
        let response: DropdownResponse = fetched.data.json()?;

        if !response.is_success() {
            return Err(FetchError::Api {
                status: response.status,
            });
        }

        debug!(
            screen,
            language = %language,
            dropdowns = response.dropdowns.len(),
            source = ?fetched.source,
            "Fetched dropdown content"
        );
        Ok(response)
    }
}
