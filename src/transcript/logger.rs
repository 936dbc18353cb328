//! Conversation transcript accumulator.
//!
//! Activities buffer in memory per conversation until an outbound activity
//! carries the end-of-session sentinel; the user's side of the conversation
//! is then appended to the sink and the whole session is discarded.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::activity::{Activity, ActivityKind, Role};
use crate::error::TranscriptError;
use crate::transcript::sink::TranscriptSink;

/// One logged activity, trimmed to the fields a transcript reader needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub role: Role,
    pub from: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    pub conversation: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&Activity> for TranscriptEntry {
    fn from(activity: &Activity) -> Self {
        Self {
            kind: activity.kind,
            role: activity.from.role,
            from: activity.from.name.clone(),
            text: activity.text.clone(),
            value: activity.value.clone(),
            conversation: activity.conversation.id.clone(),
            timestamp: activity.timestamp,
        }
    }
}

/// Buffers for one conversation. Both sides are kept together so ending a
/// session drops everything at once.
#[derive(Debug, Default)]
struct SessionLog {
    all: Vec<TranscriptEntry>,
    user_only: Vec<TranscriptEntry>,
}

/// Accumulates activities per conversation and flushes the user's side to
/// a [`TranscriptSink`] when the end-of-session sentinel passes through.
pub struct TranscriptLogger {
    sessions: RwLock<HashMap<String, SessionLog>>,
    sink: Arc<dyn TranscriptSink>,
}

/// Conversation IDs may carry `|`-delimited channel suffixes; transcript
/// sessions bucket on the portion before the first delimiter.
pub fn conversation_key(raw: &str) -> &str {
    raw.split('|').next().unwrap_or(raw)
}

impl TranscriptLogger {
    pub fn new(sink: Arc<dyn TranscriptSink>) -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            sink,
        })
    }

    /// Record one activity. Starts a session on a conversation's first
    /// activity, and flushes then discards the session when the activity
    /// carries the end-of-session sentinel.
    pub async fn log_activity(&self, activity: &Activity) -> Result<(), TranscriptError> {
        if activity.conversation.id.is_empty() {
            return Err(TranscriptError::MissingConversation);
        }
        let key = conversation_key(&activity.conversation.id).to_string();
        let entry = TranscriptEntry::from(activity);

        {
            let mut sessions = self.sessions.write().await;
            let session = sessions.entry(key.clone()).or_insert_with(|| {
                debug!(conversation = %key, "New transcript session");
                SessionLog::default()
            });
            if activity.from.role == Role::User && activity.kind == ActivityKind::Message {
                session.user_only.push(entry.clone());
            }
            session.all.push(entry);
        }

        if activity.is_end_of_session() {
            self.flush(&key).await?;
        }
        Ok(())
    }

    /// Append the session's user-side entries to the sink, then drop the
    /// session. Errors leave the buffers in place so a later sentinel can
    /// retry the flush.
    async fn flush(&self, key: &str) -> Result<(), TranscriptError> {
        let payload = {
            let sessions = self.sessions.read().await;
            let Some(session) = sessions.get(key) else {
                return Ok(());
            };
            let mut payload = String::new();
            for entry in &session.user_only {
                payload.push_str(&serde_json::to_string_pretty(entry)?);
                payload.push('\n');
            }
            payload
        };

        self.sink.append(&payload).await?;

        if let Some(session) = self.sessions.write().await.remove(key) {
            info!(
                conversation = %key,
                entries = session.user_only.len(),
                "Transcript flushed"
            );
        }
        Ok(())
    }

    /// Number of conversations with a live buffer.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Buffer sizes for a conversation as `(all, user_only)`, if a session
    /// exists.
    pub async fn buffered(&self, conversation_id: &str) -> Option<(usize, usize)> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(conversation_key(conversation_id))?;
        Some((session.all.len(), session.user_only.len()))
    }
}
