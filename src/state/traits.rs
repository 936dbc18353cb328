//! Storage abstraction for turn state.

use async_trait::async_trait;

use crate::error::StoreError;

/// Keyed JSON document store backing the bot's persisted state.
///
/// Reads and writes are whole-document and non-transactional. Callers that
/// need read-modify-write consistency serialize their own access; the bot
/// handles turns for a given conversation one at a time.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch the document stored under `key`, if any.
    async fn read(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError>;

    /// Store `value` under `key`, replacing any previous document.
    async fn write(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError>;
}
