//! Durable client storage for the tab session snapshot.
//!
//! In the browser this is `localStorage`; everywhere else (tests, native
//! tooling) an in-memory map stands in.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("durable storage is not available")]
    Unavailable,
    #[error("failed to read '{key}': {message}")]
    Read { key: String, message: String },
    #[error("failed to write '{key}': {message}")]
    Write { key: String, message: String },
    #[error("snapshot codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

pub trait SnapshotStorage: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// `window.localStorage`
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserStorage;

fn get_local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

impl SnapshotStorage for BrowserStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let storage = get_local_storage().ok_or(StorageError::Unavailable)?;
        storage.get_item(key).map_err(|e| StorageError::Read {
            key: key.to_string(),
            message: format!("{:?}", e),
        })
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let storage = get_local_storage().ok_or(StorageError::Unavailable)?;
        // QuotaExceededError lands here
        storage.set_item(key, value).map_err(|e| StorageError::Write {
            key: key.to_string(),
            message: format!("{:?}", e),
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let storage = get_local_storage().ok_or(StorageError::Unavailable)?;
        storage.remove_item(key).map_err(|e| StorageError::Write {
            key: key.to_string(),
            message: format!("{:?}", e),
        })
    }
}

/// In-memory storage. Clones share the same map, which lets a test "reload"
/// the page by building a second store over the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SnapshotStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.items().remove(key);
        Ok(())
    }
}

/// Storage backend for the current target.
pub fn default_storage() -> Arc<dyn SnapshotStorage> {
    if cfg!(target_arch = "wasm32") {
        Arc::new(BrowserStorage)
    } else {
        Arc::new(MemoryStorage::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_is_shared_between_clones() {
        let storage = MemoryStorage::new();
        let reloaded = storage.clone();

        storage.save("tabs-storage", "{}").unwrap();
        assert_eq!(reloaded.load("tabs-storage").unwrap().as_deref(), Some("{}"));

        reloaded.remove("tabs-storage").unwrap();
        assert_eq!(storage.load("tabs-storage").unwrap(), None);
    }
}
