//! Client-local key-value storage with change notifications.
//!
//! Every write is broadcast to all subscribers together with the session
//! that made it, so a session can ignore its own echoes and react only to
//! changes made elsewhere.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use crate::error::{CartError, Result};

/// Key holding the serialized cart.
pub const CART_KEY: &str = "cart";

/// Key holding the signed-in customer's profile.
pub const CUSTOMER_KEY: &str = "customer";

const CHANNEL_CAPACITY: usize = 64;

/// Identifies one open session (one "tab") sharing a storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A change written to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    /// The session that made the change.
    pub origin: SessionId,
    /// New value, or `None` if the key was removed.
    pub value: Option<String>,
}

/// Persisted key-value store shared by the sessions of one client.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Reads the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key` and notifies subscribers.
    async fn set(&self, origin: SessionId, key: &str, value: String) -> Result<()>;

    /// Deletes `key` and notifies subscribers.
    async fn remove(&self, origin: SessionId, key: &str) -> Result<()>;

    /// Subscribes to changes made through this storage.
    fn subscribe(&self) -> broadcast::Receiver<StorageEvent>;
}

fn notify(sender: &broadcast::Sender<StorageEvent>, event: StorageEvent) {
    // No receivers is fine: nobody else is listening.
    let _ = sender.send(event);
}

#[derive(Debug, Default)]
struct InMemoryStorageState {
    entries: HashMap<String, String>,
    fail_on_write: bool,
}

/// In-memory storage; clones share the same entries and notification channel.
#[derive(Debug, Clone)]
pub struct InMemoryStorage {
    state: Arc<RwLock<InMemoryStorageState>>,
    events: broadcast::Sender<StorageEvent>,
}

impl InMemoryStorage {
    /// Creates an empty in-memory storage.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            state: Arc::new(RwLock::new(InMemoryStorageState::default())),
            events,
        }
    }

    /// Writes a raw value without notifying anyone, as if another program
    /// had edited the underlying store.
    pub async fn put_raw(&self, key: &str, value: impl Into<String>) {
        self.state
            .write()
            .await
            .entries
            .insert(key.to_string(), value.into());
    }

    /// Configures the storage to fail every write.
    pub async fn set_fail_on_write(&self, fail: bool) {
        self.state.write().await.fail_on_write = fail;
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.state.read().await.entries.get(key).cloned())
    }

    async fn set(&self, origin: SessionId, key: &str, value: String) -> Result<()> {
        {
            let mut state = self.state.write().await;
            if state.fail_on_write {
                return Err(CartError::Storage {
                    key: key.to_string(),
                    source: std::io::Error::other("storage quota exceeded"),
                });
            }
            state.entries.insert(key.to_string(), value.clone());
        }
        notify(
            &self.events,
            StorageEvent {
                key: key.to_string(),
                origin,
                value: Some(value),
            },
        );
        Ok(())
    }

    async fn remove(&self, origin: SessionId, key: &str) -> Result<()> {
        self.state.write().await.entries.remove(key);
        notify(
            &self.events,
            StorageEvent {
                key: key.to_string(),
                origin,
                value: None,
            },
        );
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}

/// Storage backed by one JSON file per key in a directory.
///
/// Notifications reach sessions in the same process; sessions in other
/// processes pick changes up through [`crate::CartStore::refresh`].
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    events: broadcast::Sender<StorageEvent>,
}

impl FileStorage {
    /// Opens (and creates if needed) a storage directory.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| CartError::Storage {
                key: dir.display().to_string(),
                source,
            })?;
        let (events, _) = broadcast::channel(CHANNEL_CAPACITY);
        Ok(Self { dir, events })
    }

    /// Returns the storage directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

fn storage_error(key: &str, source: std::io::Error) -> CartError {
    CartError::Storage {
        key: key.to_string(),
        source,
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error(key, e)),
        }
    }

    async fn set(&self, origin: SessionId, key: &str, value: String) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension(format!("json.{origin}.tmp"));
        tokio::fs::write(&tmp, value.as_bytes())
            .await
            .map_err(|e| storage_error(key, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| storage_error(key, e))?;

        notify(
            &self.events,
            StorageEvent {
                key: key.to_string(),
                origin,
                value: Some(value),
            },
        );
        Ok(())
    }

    async fn remove(&self, origin: SessionId, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(storage_error(key, e)),
        }
        notify(
            &self.events,
            StorageEvent {
                key: key.to_string(),
                origin,
                value: None,
            },
        );
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("cart-storage-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_in_memory_set_notifies_with_origin() {
        let storage = InMemoryStorage::new();
        let mut rx = storage.subscribe();
        let origin = SessionId::new();

        storage.set(origin, CART_KEY, "[]".to_string()).await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.key, CART_KEY);
        assert_eq!(event.origin, origin);
        assert_eq!(event.value.as_deref(), Some("[]"));
        assert_eq!(storage.get(CART_KEY).await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_in_memory_fail_on_write() {
        let storage = InMemoryStorage::new();
        storage.set_fail_on_write(true).await;

        let result = storage.set(SessionId::new(), CART_KEY, "[]".to_string()).await;
        assert!(matches!(result, Err(CartError::Storage { .. })));
        assert!(storage.get(CART_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_storage_roundtrip_and_remove() {
        let dir = temp_dir();
        let storage = FileStorage::open(&dir).await.unwrap();
        let origin = SessionId::new();

        assert!(storage.get(CART_KEY).await.unwrap().is_none());

        storage.set(origin, CART_KEY, "[1]".to_string()).await.unwrap();
        assert_eq!(storage.get(CART_KEY).await.unwrap().as_deref(), Some("[1]"));

        storage.remove(origin, CART_KEY).await.unwrap();
        assert!(storage.get(CART_KEY).await.unwrap().is_none());

        // Removing twice is not an error.
        storage.remove(origin, CART_KEY).await.unwrap();

        let _ = tokio::fs::remove_dir_all(dir).await;
    }
}
