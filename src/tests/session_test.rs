use serde_json::json;
use std::sync::Arc;

use crate::auth::{AuthClient, SessionManager};
use crate::config::{endpoints, ApiConfig};
use crate::http::MockHttpClient;
use crate::storage::{keys, MemoryTokenStore, TokenStore};

fn test_config() -> ApiConfig {
    ApiConfig {
        base_url: "http://backend".to_string(),
        timeout_secs: 5,
    }
}

fn url(path: &str) -> String {
    format!("http://backend{}", path)
}

fn build_session() -> (MockHttpClient, Arc<MemoryTokenStore>, SessionManager) {
    let mock = MockHttpClient::new();
    let store = Arc::new(MemoryTokenStore::new());
    let client = Arc::new(AuthClient::new(
        test_config(),
        Arc::new(mock.clone()),
        store.clone(),
    ));
    (mock, store, SessionManager::new(client))
}

#[tokio::test]
async fn initialize_without_stored_token_is_unauthenticated() {
    let (mock, _store, session) = build_session();

    session.initialize().await.unwrap();
    assert!(!session.is_authenticated().await);
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn initialize_fast_path_uses_cached_user_without_network() {
    let (mock, store, session) = build_session();
    store.put(keys::ACCESS_TOKEN, json!("A1")).await;
    store.put(keys::REFRESH_TOKEN, json!("R1")).await;
    store
        .put(keys::USER_DATA, json!({"id": 1, "email": "user@example.com"}))
        .await;

    session.initialize().await.unwrap();

    assert!(session.is_authenticated().await);
    assert_eq!(
        session.user().await,
        Some(json!({"id": 1, "email": "user@example.com"}))
    );
    assert!(mock.requests().is_empty(), "fast path must not hit the server");
}

#[tokio::test]
async fn initialize_slow_path_fetches_and_caches_the_profile() {
    let (mock, store, session) = build_session();
    store.put(keys::ACCESS_TOKEN, json!("A1")).await;
    store.put(keys::REFRESH_TOKEN, json!("R1")).await;
    mock.push_json(
        "GET",
        &url(endpoints::ME),
        200,
        &json!({"id": 7, "email": "new@example.com"}),
    );

    session.initialize().await.unwrap();

    assert!(session.is_authenticated().await);
    assert_eq!(
        store.get(keys::USER_DATA).await,
        Some(json!({"id": 7, "email": "new@example.com"}))
    );
}

#[tokio::test]
async fn initialize_slow_path_failure_falls_back_to_unauthenticated() {
    let (mock, store, session) = build_session();
    store.put(keys::ACCESS_TOKEN, json!("stale")).await;
    store.put(keys::REFRESH_TOKEN, json!("stale-refresh")).await;

    // stored token is rejected and the refresh token is no good either
    mock.push_json("GET", &url(endpoints::ME), 401, &json!({}));
    mock.push_json(
        "POST",
        &url(endpoints::REFRESH),
        401,
        &json!({"detail": "revoked"}),
    );

    session.initialize().await.unwrap();

    assert!(!session.is_authenticated().await);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn refresh_user_updates_the_cached_profile() {
    let (mock, store, session) = build_session();
    store.put(keys::ACCESS_TOKEN, json!("A1")).await;
    store.put(keys::REFRESH_TOKEN, json!("R1")).await;
    store.put(keys::USER_DATA, json!({"id": 1, "name": "old"})).await;
    mock.push_json(
        "GET",
        &url(endpoints::ME),
        200,
        &json!({"id": 1, "name": "new"}),
    );

    let user = session.refresh_user().await.unwrap();
    assert_eq!(user["name"], "new");
    assert_eq!(
        store.get(keys::USER_DATA).await,
        Some(json!({"id": 1, "name": "new"}))
    );
}

#[tokio::test]
async fn stored_user_profile_round_trips_unchanged() {
    let (_mock, store, session) = build_session();
    let profile = json!({
        "id": 42,
        "email": "user@example.com",
        "addresses": [{"emirate": "Dubai", "street": "Al Wasl"}],
        "flags": {"verified": true, "score": 0.25}
    });

    store.put(keys::USER_DATA, profile.clone()).await;
    assert_eq!(session.user().await, Some(profile));
}
