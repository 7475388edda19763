//! Persisted key/value storage contract.
//!
//! Mirrors the browser `localStorage` surface (`getItem` / `setItem` /
//! `removeItem`) so persisted form state and session markers can be cleared
//! when a session times out. [`MemoryStore`] is the in-process implementation
//! used by tests and by hosts without durable storage.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::StorageResult;

/// Trait for persisted storage backends.
pub trait KeyValueStore: Send + Sync {
    /// Read a raw value.
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a raw value, replacing any previous one.
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove a value. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> StorageResult<()>;

    /// List all stored keys.
    fn keys(&self) -> StorageResult<Vec<String>>;

    /// Remove every stored value.
    ///
    /// The default implementation removes keys one by one and stops at the
    /// first failure.
    fn clear(&self) -> StorageResult<()> {
        for key in self.keys()? {
            self.remove_item(&key)?;
        }
        Ok(())
    }
}

/// Shared storage handle.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// In-memory storage backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.items
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.items.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.items.read().keys().cloned().collect())
    }

    fn clear(&self) -> StorageResult<()> {
        self.items.write().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let store = MemoryStore::new();
        store.set_item("auth_token", "abc").unwrap();
        assert_eq!(store.get_item("auth_token").unwrap().as_deref(), Some("abc"));

        store.remove_item("auth_token").unwrap();
        assert!(store.get_item("auth_token").unwrap().is_none());
        // Removing twice is fine
        store.remove_item("auth_token").unwrap();
    }

    #[test]
    fn test_keys_through_trait_object() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        store.set_item("mortgage_form", "{}").unwrap();
        store.set_item("auth_token", "abc").unwrap();
        assert_eq!(store.keys().unwrap(), vec!["auth_token", "mortgage_form"]);
    }

    #[test]
    fn test_clear() {
        let store = MemoryStore::new();
        store.set_item("a", "1").unwrap();
        store.set_item("b", "2").unwrap();
        store.clear().unwrap();
        assert!(store.is_empty());
    }
}
