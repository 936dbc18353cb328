//! Turn context — everything one activity's processing can reach.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::warn;

use crate::activity::Activity;
use crate::error::ChannelError;
use crate::transcript::TranscriptLogger;

/// Outbound half of a channel: delivers activities to the user.
#[async_trait]
pub trait ActivitySink: Send + Sync {
    async fn deliver(&self, activity: &Activity) -> Result<(), ChannelError>;
}

/// Per-turn context wrapping the inbound activity and the reply path.
///
/// Every outbound send is mirrored into the transcript logger before
/// delivery, and delivery marks the turn as responded. Transcript failures
/// on the outbound path are logged and swallowed; a broken transcript
/// should not stop the bot from answering.
pub struct TurnContext {
    activity: Activity,
    sink: Arc<dyn ActivitySink>,
    transcript: Arc<TranscriptLogger>,
    responded: bool,
}

impl TurnContext {
    pub fn new(
        activity: Activity,
        sink: Arc<dyn ActivitySink>,
        transcript: Arc<TranscriptLogger>,
    ) -> Self {
        Self {
            activity,
            sink,
            transcript,
            responded: false,
        }
    }

    /// The inbound activity that started this turn.
    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    /// Whether anything has been delivered during this turn.
    pub fn responded(&self) -> bool {
        self.responded
    }

    /// Send a plain text reply to the inbound activity's sender.
    pub async fn send_text(&mut self, text: impl Into<String>) -> Result<(), ChannelError> {
        let reply = self.activity.reply(text);
        self.send(reply).await
    }

    /// Send a fully built activity.
    pub async fn send(&mut self, activity: Activity) -> Result<(), ChannelError> {
        if let Err(e) = self.transcript.log_activity(&activity).await {
            warn!(error = %e, "Failed to log outbound activity");
        }
        self.sink.deliver(&activity).await?;
        self.responded = true;
        Ok(())
    }
}

/// Sink that collects delivered activities in memory. Useful for tests
/// and harnesses that inspect what the bot said.
#[derive(Default)]
pub struct CollectingSink {
    delivered: Mutex<Vec<Activity>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every activity delivered since the last drain.
    pub async fn drain(&self) -> Vec<Activity> {
        std::mem::take(&mut *self.delivered.lock().await)
    }

    /// Text lines delivered since the last drain.
    pub async fn drain_texts(&self) -> Vec<String> {
        self.drain()
            .await
            .into_iter()
            .filter_map(|a| a.text)
            .collect()
    }
}

#[async_trait]
impl ActivitySink for CollectingSink {
    async fn deliver(&self, activity: &Activity) -> Result<(), ChannelError> {
        self.delivered.lock().await.push(activity.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ChannelAccount;
    use crate::transcript::{MemorySink, TranscriptSink};

    fn turn(sink: Arc<CollectingSink>) -> TurnContext {
        let inbound = Activity::message(
            "conv-1",
            ChannelAccount::user("u1", "User"),
            ChannelAccount::bot("b1", "Bot"),
            "hi",
        );
        let transcript = TranscriptLogger::new(Arc::new(MemorySink::new()) as Arc<dyn TranscriptSink>);
        TurnContext::new(inbound, sink, transcript)
    }

    #[tokio::test]
    async fn send_text_replies_to_the_sender_and_marks_responded() {
        let sink = Arc::new(CollectingSink::new());
        let mut ctx = turn(sink.clone());
        assert!(!ctx.responded());

        ctx.send_text("hello").await.unwrap();
        assert!(ctx.responded());

        let delivered = sink.drain().await;
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].text.as_deref(), Some("hello"));
        assert_eq!(delivered[0].recipient.id, "u1");
    }

    #[tokio::test]
    async fn outbound_sends_are_mirrored_into_the_transcript() {
        let sink = Arc::new(CollectingSink::new());
        let transcript_sink = Arc::new(MemorySink::new());
        let transcript =
            TranscriptLogger::new(transcript_sink.clone() as Arc<dyn TranscriptSink>);
        let inbound = Activity::message(
            "conv-1",
            ChannelAccount::user("u1", "User"),
            ChannelAccount::bot("b1", "Bot"),
            "hi",
        );
        let mut ctx = TurnContext::new(inbound, sink, transcript.clone());

        ctx.send_text("hello").await.unwrap();
        // One outbound entry buffered under this conversation.
        assert_eq!(transcript.buffered("conv-1").await, Some((1, 0)));
    }
}
