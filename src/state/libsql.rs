//! libSQL-backed session store.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database, params};
use tracing::info;

use crate::error::StoreError;
use crate::state::traits::SessionStore;

/// Durable store keeping one JSON document per key in a single table.
///
/// One connection serves every call; `libsql::Connection` handles concurrent
/// async use on its own.
pub struct LibSqlStore {
    #[allow(dead_code)]
    db: Arc<Database>,
    conn: Connection,
}

impl LibSqlStore {
    /// Open (or create) a local database file and prepare the schema.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Backend(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Backend(format!("Failed to create connection: {e}")))?;

        let store = Self {
            db: Arc::new(db),
            conn,
        };
        store.init_schema().await?;
        info!(path = %path.display(), "Session store opened");
        Ok(store)
    }

    /// Open a throwaway in-memory database. Test-only in practice.
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                StoreError::Backend(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Backend(format!("Failed to create connection: {e}")))?;

        let store = Self {
            db: Arc::new(db),
            conn,
        };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS session_state (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                )",
                (),
            )
            .await
            .map_err(|e| StoreError::Backend(format!("init_schema: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for LibSqlStore {
    async fn read(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        let mut rows = self
            .conn
            .query(
                "SELECT value FROM session_state WHERE key = ?1",
                params![key],
            )
            .await
            .map_err(|e| StoreError::Backend(format!("read: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let raw: String = row
                    .get(0)
                    .map_err(|e| StoreError::Backend(format!("read: {e}")))?;
                Ok(Some(serde_json::from_str(&raw)?))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::Backend(format!("read: {e}"))),
        }
    }

    async fn write(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&value)?;
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO session_state (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT (key) DO UPDATE SET value = ?2, updated_at = ?3",
                params![key, raw, now],
            )
            .await
            .map_err(|e| StoreError::Backend(format!("write: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn round_trips_documents() {
        let store = LibSqlStore::new_memory().await.unwrap();
        assert_eq!(store.read("users/u1").await.unwrap(), None);

        store
            .write("users/u1", json!({"entry_read": 2}))
            .await
            .unwrap();
        assert_eq!(
            store.read("users/u1").await.unwrap(),
            Some(json!({"entry_read": 2}))
        );
    }

    #[tokio::test]
    async fn upsert_replaces_previous_document() {
        let store = LibSqlStore::new_memory().await.unwrap();
        store.write("k", json!({"v": 1})).await.unwrap();
        store.write("k", json!({"v": 2})).await.unwrap();
        assert_eq!(store.read("k").await.unwrap(), Some(json!({"v": 2})));
    }

    #[tokio::test]
    async fn persists_across_connections_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.db");
        {
            let store = LibSqlStore::new_local(&path).await.unwrap();
            store.write("k", json!("kept")).await.unwrap();
        }
        let reopened = LibSqlStore::new_local(&path).await.unwrap();
        assert_eq!(reopened.read("k").await.unwrap(), Some(json!("kept")));
    }
}
