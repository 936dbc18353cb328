//! Console channel — stdin/stdout loop for running the bot locally.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::error;
use uuid::Uuid;

use crate::activity::{Activity, ChannelAccount};
use crate::context::ActivitySink;
use crate::error::ChannelError;

/// Stream of inbound activities produced by a channel.
pub type ActivityStream = Pin<Box<dyn Stream<Item = Activity> + Send>>;

/// Reads lines from stdin and turns each one into a message activity in a
/// single local conversation.
pub struct ConsoleChannel {
    conversation_id: String,
    user: ChannelAccount,
    bot: ChannelAccount,
}

impl ConsoleChannel {
    pub fn new(bot_name: impl Into<String>) -> Self {
        Self {
            conversation_id: format!("console-{}", Uuid::new_v4()),
            user: ChannelAccount::user("local-user", "You"),
            bot: ChannelAccount::bot("console-bot", bot_name),
        }
    }

    /// The membership activity a channel emits when the local user joins.
    /// Run this through the bot once before reading input so the greeting
    /// fires.
    pub fn join_activity(&self) -> Activity {
        Activity::members_added(
            self.conversation_id.clone(),
            vec![self.user.clone()],
            self.user.clone(),
            self.bot.clone(),
        )
    }

    /// Spawn the stdin reader and return the inbound activity stream.
    /// The stream ends on EOF.
    pub fn start(&self) -> ActivityStream {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let conversation = self.conversation_id.clone();
        let user = self.user.clone();
        let bot = self.bot.clone();

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            eprint!("> ");

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            eprint!("> ");
                            continue;
                        }
                        let activity = Activity::message(
                            conversation.clone(),
                            user.clone(),
                            bot.clone(),
                            line,
                        );
                        if tx.send(activity).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        error!("Error reading stdin: {e}");
                        break;
                    }
                }
            }
        });

        Box::pin(UnboundedReceiverStream::new(rx))
    }
}

/// Prints bot replies to stdout and reissues the input prompt.
pub struct ConsoleSink;

#[async_trait]
impl ActivitySink for ConsoleSink {
    async fn deliver(&self, activity: &Activity) -> Result<(), ChannelError> {
        if let Some(text) = &activity.text {
            println!("\n{text}\n");
            eprint!("> ");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{ActivityKind, Role};

    #[test]
    fn join_activity_announces_the_local_user() {
        let channel = ConsoleChannel::new("test-bot");
        let join = channel.join_activity();

        assert_eq!(join.kind, ActivityKind::ConversationUpdate);
        assert_eq!(join.members_added.len(), 1);
        assert_eq!(join.members_added[0].role, Role::User);
        assert_eq!(join.recipient.id, "console-bot");
        assert_eq!(join.conversation.id, channel.join_activity().conversation.id);
    }
}
