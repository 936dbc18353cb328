//! Typed state accessors with a per-turn cache.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StoreError;
use crate::state::traits::SessionStore;

/// Scoped, typed view over a [`SessionStore`] holding one document per key.
///
/// `get` loads through a cache that lives until `save_changes` writes the
/// entry back and drops it, so every read within a turn sees one snapshot.
/// Loading and saving are separate steps on purpose: a turn mutates its
/// copy freely, and nothing touches the store until the dispatcher
/// persists on the way out.
pub struct BotState<T> {
    store: Arc<dyn SessionStore>,
    scope: &'static str,
    cache: RwLock<HashMap<String, T>>,
}

impl<T> BotState<T>
where
    T: Clone + Default + Serialize + DeserializeOwned + Send + Sync,
{
    pub fn new(store: Arc<dyn SessionStore>, scope: &'static str) -> Self {
        Self {
            store,
            scope,
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}/{}", self.scope, key)
    }

    /// Fetch the document for `key`, defaulting when the store has none.
    pub async fn get(&self, key: &str) -> Result<T, StoreError> {
        if let Some(cached) = self.cache.read().await.get(key) {
            return Ok(cached.clone());
        }
        let value = match self.store.read(&self.storage_key(key)).await? {
            Some(raw) => serde_json::from_value(raw)?,
            None => T::default(),
        };
        self.cache
            .write()
            .await
            .insert(key.to_string(), value.clone());
        Ok(value)
    }

    /// Stage a document for `key`. Nothing hits the store until
    /// [`save_changes`](Self::save_changes).
    pub async fn set(&self, key: &str, value: T) {
        self.cache.write().await.insert(key.to_string(), value);
    }

    /// Write the staged document for `key` to the store and drop it from
    /// the cache. A key that was never loaded or staged is a no-op.
    pub async fn save_changes(&self, key: &str) -> Result<(), StoreError> {
        let Some(value) = self.cache.write().await.remove(key) else {
            return Ok(());
        };
        let raw = serde_json::to_value(&value)?;
        debug!(scope = self.scope, key, "Persisting state");
        self.store.write(&self.storage_key(key), raw).await
    }
}
