//! The full request path: debounce, retry, cache and session purge.

use std::sync::Arc;
use std::time::Duration;

use bankim::DataLayer;
use bankim::cache::{CacheConfig, TtlCache};
use bankim::client::{FetchClient, Language, RetryPolicy};
use bankim::debounce::{DebounceCategory, DebouncePresets};
use bankim::session::{ActivityHub, SessionNotice, SessionState, SessionTimeoutConfig};
use bankim::types::{KeyValueStore, MemoryStore};
use futures::future::join_all;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DROPDOWN_PATH: &str = "/api/dropdowns/mortgage_step1/en";

fn payload() -> serde_json::Value {
    screen_payload("mortgage_step1")
}

fn screen_payload(screen: &str) -> serde_json::Value {
    serde_json::json!({
        "status": "success",
        "screen_location": screen,
        "language_code": "en",
        "dropdowns": [{"key": "mortgage_step1_first_home", "label": "First home?"}],
        "options": {
            "mortgage_step1_first": [
                {"value": "yes", "label": "Yes"},
                {"value": "no", "label": "No"}
            ]
        },
        "placeholders": {},
        "labels": {"mortgage_step1_first_label": "Is this your first home?"}
    })
}

fn layer(server: &MockServer, store: Arc<MemoryStore>) -> DataLayer {
    let client = FetchClient::builder()
        .base_url(server.uri())
        .retry_policy(RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(5),
            multiplier: 2.0,
            max_delay: Duration::from_millis(50),
        })
        .build()
        .unwrap();
    let cache = TtlCache::new(
        CacheConfig::new("dropdowns")
            .with_max_entries(10)
            .with_ttl(Duration::from_secs(300)),
    );
    let presets = DebouncePresets {
        search: Duration::from_millis(20),
        ..DebouncePresets::default()
    };
    DataLayer::new(client, cache, presets, store)
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.map(|r| r.len()).unwrap_or(0)
}

async fn mount_flaky(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(DROPDOWN_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(DROPDOWN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_flaky_backend_then_cache_hit() {
    let server = MockServer::start().await;
    mount_flaky(&server).await;
    let layer = layer(&server, Arc::new(MemoryStore::new()));

    let first = layer
        .dropdowns("mortgage_step1", Language::En)
        .await
        .unwrap();
    assert_eq!(request_count(&server).await, 3);
    assert_eq!(layer.dropdown_cache().len(), 1);

    let second = layer
        .dropdowns("mortgage_step1", Language::En)
        .await
        .unwrap();
    assert_eq!(request_count(&server).await, 3);
    assert_eq!(first, second);

    let field = second.field("mortgage_step1", "first_home");
    assert_eq!(field.options.len(), 2);
    assert_eq!(field.label.as_deref(), Some("Is this your first home?"));
}

#[tokio::test]
async fn test_debounced_burst_makes_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DROPDOWN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload()))
        .mount(&server)
        .await;
    let layer = layer(&server, Arc::new(MemoryStore::new()));
    let loader = layer.dropdown_loader(DebounceCategory::Search);

    let waiters: Vec<_> = (0..10)
        .map(|_| loader.load("mortgage_step1", Language::En))
        .collect();
    for outcome in join_all(waiters).await {
        assert!(outcome.is_resolved());
    }

    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_debounced_burst_across_screens() {
    let server = MockServer::start().await;
    for screen in ["mortgage_step1", "credit_step1"] {
        Mock::given(method("GET"))
            .and(path(format!("/api/dropdowns/{screen}/en")))
            .respond_with(ResponseTemplate::new(200).set_body_json(screen_payload(screen)))
            .mount(&server)
            .await;
    }
    let layer = layer(&server, Arc::new(MemoryStore::new()));
    let loader = layer.dropdown_loader(DebounceCategory::Search);

    let mut waiters = Vec::new();
    for _ in 0..3 {
        for screen in ["mortgage_step1", "credit_step1"] {
            waiters.push((screen, loader.load(screen, Language::En)));
        }
    }
    assert!(loader.is_pending("mortgage_step1", Language::En));
    assert!(loader.is_pending("credit_step1", Language::En));

    for (asked, waiter) in waiters {
        let response = waiter.await.into_result().unwrap().unwrap();
        assert_eq!(response.screen_location, asked);
    }
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn test_session_timeout_purges_cache_and_storage() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DROPDOWN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload()))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    store.set_item("mortgage_step1_form", "{}").unwrap();
    let layer = layer(&server, store.clone());
    layer
        .dropdowns("mortgage_step1", Language::En)
        .await
        .unwrap();

    let hub = ActivityHub::new();
    let config = SessionTimeoutConfig::new(Duration::from_millis(40), Duration::from_millis(80));
    let (manager, mut notices) = layer.start_session_with(config, &hub).unwrap();

    let mut states = manager.subscribe_state();
    while *states.borrow_and_update() != SessionState::Expired {
        states.changed().await.unwrap();
    }

    assert!(layer.dropdown_cache().is_empty());
    assert!(store.is_empty());
    assert!(matches!(
        notices.recv().await.unwrap(),
        SessionNotice::Warning { .. }
    ));
    assert!(matches!(
        notices.recv().await.unwrap(),
        SessionNotice::Redirect { ref path, .. } if path == "/login"
    ));

    // Purged content is fetched again
    layer
        .dropdowns("mortgage_step1", Language::En)
        .await
        .unwrap();
    assert_eq!(request_count(&server).await, 2);
}
