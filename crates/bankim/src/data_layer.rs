//! End-to-end composition of the resilience components.

use std::future::Future;
use std::sync::Arc;

use bankim_cache::TtlCache;
use bankim_client::{
    DropdownResponse, DropdownsApi, FetchClient, FetchError, Language, RetryPolicy,
};
use bankim_config::BankimConfig;
use bankim_debounce::{DebounceCategory, DebounceOutcome, DebouncePresets, KeyedDebounced};
use bankim_session::{
    ActivityHub, DefaultSessionHandler, SessionManager, SessionNotice, SessionTimeoutConfig,
};
use bankim_types::SharedStore;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::error::Result;

/// Outcome of a debounced dropdown load. Errors are shared between all
/// waiters of a window.
pub type DropdownOutcome = DebounceOutcome<DropdownResponse, Arc<FetchError>>;

/// Debounced dropdown loader with one window per screen and language.
///
/// A burst of loads for the same screen collapses into one fetch; loads for
/// different screens never wait on each other's window.
#[derive(Debug, Clone)]
pub struct DropdownLoader {
    debounced: KeyedDebounced<String, (String, Language), DropdownResponse, Arc<FetchError>>,
}

impl DropdownLoader {
    /// Join the window for `screen` in `language`.
    ///
    /// Registration happens before this returns.
    pub fn load(
        &self,
        screen: &str,
        language: Language,
    ) -> impl Future<Output = DropdownOutcome> + Send + use<> {
        self.debounced.call(
            DropdownsApi::cache_key(screen, language),
            (screen.to_string(), language),
        )
    }

    /// Whether a load for `screen` in `language` is waiting for its window.
    pub fn is_pending(&self, screen: &str, language: Language) -> bool {
        self.debounced
            .is_pending(&DropdownsApi::cache_key(screen, language))
    }

    /// Cancel the scheduled load for `screen` in `language`.
    pub fn cancel(&self, screen: &str, language: Language) -> bool {
        self.debounced
            .cancel(&DropdownsApi::cache_key(screen, language))
    }
}

/// The data-access layer as the UI sees it.
///
/// Requests flow UI → debounce → retrying client → cache. Session expiry
/// purges the cache and clears the persisted store.
#[derive(Clone)]
pub struct DataLayer {
    client: FetchClient,
    dropdowns: TtlCache<DropdownResponse>,
    presets: DebouncePresets,
    session: SessionTimeoutConfig,
    store: SharedStore,
}

impl DataLayer {
    /// Build every component from a loaded configuration.
    pub fn from_config(config: &BankimConfig, store: SharedStore) -> Result<Self> {
        let client_config = config.client();
        let mut builder = FetchClient::builder()
            .base_url(&client_config.base_url)
            .timeout(client_config.timeout())
            .retry_policy(RetryPolicy::from_provider(&config.retry()));
        if let Some(token) = &client_config.auth_token {
            builder = builder.auth_token(token);
        }

        let cache = bankim_cache::CacheConfig::from_provider("dropdowns", &config.cache());
        let layer = Self::new(
            builder.build()?,
            TtlCache::new(cache),
            DebouncePresets::from_provider(&config.debounce()),
            store,
        );
        Ok(layer.with_session_config(SessionTimeoutConfig::from_provider(&config.session())))
    }

    /// Compose from prebuilt parts, with default session timeouts.
    pub fn new(
        client: FetchClient,
        dropdowns: TtlCache<DropdownResponse>,
        presets: DebouncePresets,
        store: SharedStore,
    ) -> Self {
        Self {
            client,
            dropdowns,
            presets,
            session: SessionTimeoutConfig::default(),
            store,
        }
    }

    /// Use `session` for [`start_session`](Self::start_session).
    pub fn with_session_config(mut self, session: SessionTimeoutConfig) -> Self {
        self.session = session;
        self
    }

    pub fn client(&self) -> &FetchClient {
        &self.client
    }

    pub fn dropdown_cache(&self) -> &TtlCache<DropdownResponse> {
        &self.dropdowns
    }

    pub fn presets(&self) -> &DebouncePresets {
        &self.presets
    }

    pub fn session_config(&self) -> &SessionTimeoutConfig {
        &self.session
    }

    /// Dropdown content for `screen`, from cache when fresh.
    ///
    /// Only successful payloads are cached.
    pub async fn dropdowns(&self, screen: &str, language: Language) -> Result<DropdownResponse> {
        Ok(self.load_dropdowns(screen, language).await?)
    }

    async fn load_dropdowns(
        &self,
        screen: &str,
        language: Language,
    ) -> bankim_client::Result<DropdownResponse> {
        let key = DropdownsApi::cache_key(screen, language);
        if let Some(cached) = self.dropdowns.get(&key) {
            trace!(key = %key, "Dropdown cache hit");
            return Ok(cached);
        }

        let response = self.client.dropdowns().fetch(screen, language).await?;
        debug!(key = %key, "Caching dropdown content");
        self.dropdowns.set(key, response.clone());
        Ok(response)
    }

    /// A debounced loader for dropdown content using the delay of `category`.
    pub fn dropdown_loader(&self, category: DebounceCategory) -> DropdownLoader {
        let layer = self.clone();
        let debounced = self.presets.wrap_keyed_for(
            category,
            move |(screen, language): (String, Language)| {
                let layer = layer.clone();
                async move {
                    layer
                        .load_dropdowns(&screen, language)
                        .await
                        .map_err(Arc::new)
                }
            },
        );
        DropdownLoader { debounced }
    }

    /// Start session monitoring with the configured timeouts.
    ///
    /// Returns the manager and a receiver for UI notices.
    pub fn start_session(
        &self,
        hub: &ActivityHub,
    ) -> Result<(SessionManager, broadcast::Receiver<SessionNotice>)> {
        self.start_session_with(self.session.clone(), hub)
    }

    /// Start session monitoring that purges this layer's state on timeout.
    pub fn start_session_with(
        &self,
        config: SessionTimeoutConfig,
        hub: &ActivityHub,
    ) -> Result<(SessionManager, broadcast::Receiver<SessionNotice>)> {
        let handler = DefaultSessionHandler::new()
            .with_store(Arc::clone(&self.store))
            .with_purgeable(Arc::new(self.dropdowns.clone()));
        let notices = handler.subscribe();
        let manager = SessionManager::start(config, hub, Arc::new(handler))?;
        Ok((manager, notices))
    }
}
