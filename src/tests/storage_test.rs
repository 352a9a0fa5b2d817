use serde_json::json;
use tempfile::tempdir;

use crate::storage::{keys, FileTokenStore, MemoryTokenStore, TokenStore};

#[tokio::test]
async fn file_store_round_trips_values() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tokens.json");

    let store = FileTokenStore::open(&path).await;
    assert_eq!(store.get(keys::ACCESS_TOKEN).await, None);

    store.put(keys::ACCESS_TOKEN, json!("A1")).await;
    store.put(keys::USER_DATA, json!({"id": 1})).await;
    assert_eq!(store.get(keys::ACCESS_TOKEN).await, Some(json!("A1")));
    assert_eq!(store.get(keys::USER_DATA).await, Some(json!({"id": 1})));
}

#[tokio::test]
async fn file_store_survives_a_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tokens.json");

    {
        let store = FileTokenStore::open(&path).await;
        store.put(keys::ACCESS_TOKEN, json!("A1")).await;
        store.put(keys::REFRESH_TOKEN, json!("R1")).await;
    }

    let reopened = FileTokenStore::open(&path).await;
    assert_eq!(reopened.get(keys::ACCESS_TOKEN).await, Some(json!("A1")));
    assert_eq!(reopened.get(keys::REFRESH_TOKEN).await, Some(json!("R1")));
}

#[tokio::test]
async fn file_store_remove_persists() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tokens.json");

    let store = FileTokenStore::open(&path).await;
    store.put(keys::ACCESS_TOKEN, json!("A1")).await;
    store.put(keys::REFRESH_TOKEN, json!("R1")).await;
    store
        .remove(&[keys::ACCESS_TOKEN, keys::REFRESH_TOKEN, "never_stored"])
        .await;

    let reopened = FileTokenStore::open(&path).await;
    assert_eq!(reopened.get(keys::ACCESS_TOKEN).await, None);
    assert_eq!(reopened.get(keys::REFRESH_TOKEN).await, None);
}

#[tokio::test]
async fn corrupt_file_starts_the_store_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tokens.json");
    tokio::fs::write(&path, "{not json at all").await.unwrap();

    let store = FileTokenStore::open(&path).await;
    assert_eq!(store.get(keys::ACCESS_TOKEN).await, None);

    // the store is usable again after the first write
    store.put(keys::ACCESS_TOKEN, json!("A1")).await;
    let reopened = FileTokenStore::open(&path).await;
    assert_eq!(reopened.get(keys::ACCESS_TOKEN).await, Some(json!("A1")));
}

#[tokio::test]
async fn memory_store_basic_operations() {
    let store = MemoryTokenStore::new();
    assert!(store.is_empty().await);

    store.put("k", json!({"nested": [1, 2, 3]})).await;
    store.put("k", json!("overwritten")).await;
    assert_eq!(store.len().await, 1);
    assert_eq!(store.get("k").await, Some(json!("overwritten")));

    store.remove(&["k", "absent"]).await;
    assert!(store.is_empty().await);
}
