//! Cache-aside fetches bound to a cache slot.

use std::time::Duration;

use bankim_cache::TtlCache;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::client::FetchClient;
use crate::error::Result;
use crate::retry::RetryOptions;
use crate::transport::HttpRequest;
use crate::types::Fetched;

/// A fetcher bound to one cache key and TTL.
///
/// Created by [`FetchClient::create_cached_fetch`]. Fallback results are
/// cached too and keep their [`DataSource`](crate::DataSource) tag.
pub struct CachedFetch<T> {
    client: FetchClient,
    cache: TtlCache<Fetched<T>>,
    key: String,
    ttl: Duration,
}

impl<T> CachedFetch<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        client: FetchClient,
        cache: TtlCache<Fetched<T>>,
        key: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            client,
            cache,
            key: key.into(),
            ttl,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Serve the cached value or fetch, store and return a new one.
    ///
    /// Errors are never cached.
    pub async fn fetch(&self, request: &HttpRequest, options: &RetryOptions) -> Result<Fetched<T>> {
        if let Some(cached) = self.cache.get(&self.key) {
            trace!(key = %self.key, "Serving cached response");
            return Ok(cached);
        }

        let fetched = self
            .client
            .fetch_json_with_fallback::<T>(request, options)
            .await?;
        debug!(key = %self.key, source = ?fetched.source, "Caching fetched response");
        self.cache
            .set_with_ttl(self.key.clone(), fetched.clone(), self.ttl);
        Ok(fetched)
    }

    /// Drop the cached value so the next call refetches.
    pub fn invalidate(&self) -> bool {
        self.cache.delete(&self.key)
    }
}
