//! Durable key-value token store
//!
//! Pure CRUD with fixed keys; no validation and no expiry tracking. Token
//! expiry is discovered reactively through server 401s, never predicted
//! here. Storage I/O failures are logged and degrade to "absent" so the
//! session falls back to unauthenticated instead of crashing.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Fixed storage keys for the persisted session
pub mod keys {
    pub const ACCESS_TOKEN: &str = "auth_access_token";
    pub const REFRESH_TOKEN: &str = "auth_refresh_token";
    pub const USER_DATA: &str = "auth_user_data";
}

/// Key-value persistence seam for session state
#[async_trait]
pub trait TokenStore: Send + Sync + Debug {
    /// Store a value under a key. Failures are logged, not surfaced.
    async fn put(&self, key: &str, value: Value);

    /// Look up a value. Missing keys and storage failures both read as `None`.
    async fn get(&self, key: &str) -> Option<Value>;

    /// Remove the given keys. Removing an absent key is not an error.
    async fn remove(&self, keys: &[&str]);
}

/// JSON-file-backed store with an in-memory cache.
///
/// The file is read once on open; every mutation rewrites it. Concurrent
/// mutations are ordered by holding the cache lock across the write.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    cache: RwLock<HashMap<String, Value>>,
}

impl FileTokenStore {
    /// Open a store at the given path, loading any existing contents.
    /// A missing or unreadable file starts the store empty.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<HashMap<String, Value>>(&raw) {
                Ok(map) => {
                    debug!(path = %path.display(), entries = map.len(), "Loaded token store");
                    map
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Token store corrupt, starting empty");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read token store, starting empty");
                HashMap::new()
            }
        };
        Self {
            path,
            cache: RwLock::new(cache),
        }
    }

    async fn persist(&self, cache: &HashMap<String, Value>) {
        match serde_json::to_string_pretty(cache) {
            Ok(serialized) => {
                if let Err(e) = tokio::fs::write(&self.path, serialized).await {
                    warn!(path = %self.path.display(), error = %e, "Failed to save token store");
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to serialize token store");
            }
        }
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn put(&self, key: &str, value: Value) {
        let mut cache = self.cache.write().await;
        cache.insert(key.to_string(), value);
        self.persist(&cache).await;
    }

    async fn get(&self, key: &str) -> Option<Value> {
        self.cache.read().await.get(key).cloned()
    }

    async fn remove(&self, keys: &[&str]) {
        let mut cache = self.cache.write().await;
        let mut changed = false;
        for key in keys {
            changed |= cache.remove(*key).is_some();
        }
        if changed {
            self.persist(&cache).await;
        }
    }
}

/// In-memory store for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    map: RwLock<HashMap<String, Value>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub async fn len(&self) -> usize {
        self.map.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.map.read().await.is_empty()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn put(&self, key: &str, value: Value) {
        self.map.write().await.insert(key.to_string(), value);
    }

    async fn get(&self, key: &str) -> Option<Value> {
        self.map.read().await.get(key).cloned()
    }

    async fn remove(&self, keys: &[&str]) {
        let mut map = self.map.write().await;
        for key in keys {
            map.remove(*key);
        }
    }
}
