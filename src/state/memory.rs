//! In-memory session store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::state::traits::SessionStore;

/// Volatile store backed by a guarded map. State lasts for the process
/// lifetime only. The default when no database path is configured, and
/// the workhorse for tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn read_write_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.read("missing").await.unwrap(), None);

        store.write("k", json!({"n": 1})).await.unwrap();
        assert_eq!(store.read("k").await.unwrap(), Some(json!({"n": 1})));

        store.write("k", json!({"n": 2})).await.unwrap();
        assert_eq!(store.read("k").await.unwrap(), Some(json!({"n": 2})));
    }
}
