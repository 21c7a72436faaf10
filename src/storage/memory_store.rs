use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::store_trait::KeyValueStore;
use crate::error::AppResult;

/// In-memory store. Nothing survives the process; used for session-only
/// mode and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn set_item(&self, key: &str, value: &str) -> AppResult<()> {
        debug!("MemoryStore: set {}", key);
        self.items.write().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_item(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn remove_item(&self, key: &str) -> AppResult<()> {
        debug!("MemoryStore: remove {}", key);
        self.items.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get_item("auth_token").await.unwrap(), None);

        store.set_item("auth_token", "abc").await.unwrap();
        assert_eq!(store.get_item("auth_token").await.unwrap().as_deref(), Some("abc"));

        store.remove_item("auth_token").await.unwrap();
        store.remove_item("auth_token").await.unwrap();
        assert!(store.is_empty().await);
    }
}
