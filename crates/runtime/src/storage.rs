use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

// Storage key builders
pub mod keys {
    pub const ACTIVE_DECK: &str = "activeDeck";
    pub const ACTIVE_FILTERS: &str = "activeFilters";
    pub const LEFT_PANEL_WIDTH: &str = "leftPanelWidth";
    pub const CARDS_LAST_FETCHED: &str = "cardsLastFetched";
    pub const CARDS: &str = "cards";
}

/// String key/value storage that outlives a session.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Reads and decodes `key`. A value that fails to decode is removed so the
/// next start does not trip over it again.
pub fn get_json<T: DeserializeOwned>(store: &dyn LocalStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!("Local store read failed for key {}: {}", key, e);
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Failed to parse stored {}, clearing it: {}", key, e);
            if let Err(e) = store.remove(key) {
                warn!("Failed to clear key {}: {}", key, e);
            }
            None
        }
    }
}

pub fn set_json<T: Serialize + ?Sized>(store: &dyn LocalStore, key: &str, value: &T) -> Result<()> {
    let json_data = serde_json::to_string(value)?;
    store.set(key, &json_data)
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_helpers() {
        let store = MemoryStore::new();
        set_json(&store, "numbers", &vec![1, 2, 3]).unwrap();
        assert_eq!(get_json::<Vec<i32>>(&store, "numbers"), Some(vec![1, 2, 3]));
        assert_eq!(get_json::<Vec<i32>>(&store, "missing"), None);
    }

    #[test]
    fn test_corrupt_value_is_cleared() {
        let store = MemoryStore::new();
        store.set(keys::ACTIVE_DECK, "{not json").unwrap();
        assert_eq!(get_json::<serde_json::Value>(&store, keys::ACTIVE_DECK), None);
        assert_eq!(store.get(keys::ACTIVE_DECK).unwrap(), None);
        assert!(store.is_empty());
    }
}
