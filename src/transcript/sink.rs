//! Durable destinations for flushed transcripts.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::error::TranscriptError;

/// Append-only destination for flushed transcript payloads.
#[async_trait]
pub trait TranscriptSink: Send + Sync {
    async fn append(&self, payload: &str) -> Result<(), TranscriptError>;
}

/// Appends flushed transcripts to a file, creating parent directories and
/// the file itself on first use.
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TranscriptSink for FileSink {
    async fn append(&self, payload: &str) -> Result<(), TranscriptError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(payload.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Collects flushed payloads in memory. Useful for tests and harnesses.
#[derive(Default)]
pub struct MemorySink {
    appends: RwLock<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every payload appended so far, in order.
    pub async fn appends(&self) -> Vec<String> {
        self.appends.read().await.clone()
    }
}

#[async_trait]
impl TranscriptSink for MemorySink {
    async fn append(&self, payload: &str) -> Result<(), TranscriptError> {
        self.appends.write().await.push(payload.to_string());
        Ok(())
    }
}
