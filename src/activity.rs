//! Activity data model — the unit of exchange between user, channel, and bot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentinel carried in an activity's `value` field to mark the end of a
/// transcript session. Seeing it flushes and discards the conversation's
/// buffered transcript.
pub const END_OF_INPUT: &str = "endOfInput";

/// What kind of activity this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityKind {
    /// A text message from either party.
    #[serde(rename = "message")]
    Message,
    /// Membership change — someone joined the conversation.
    #[serde(rename = "conversationUpdate")]
    ConversationUpdate,
}

impl ActivityKind {
    /// The wire name, for log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::ConversationUpdate => "conversationUpdate",
        }
    }
}

/// Which side of the conversation an account sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Bot,
}

/// A participant in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelAccount {
    /// Stable account ID on the channel.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Whether this account is the user or the bot.
    pub role: Role,
}

impl ChannelAccount {
    /// A user-side account.
    pub fn user(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: Role::User,
        }
    }

    /// A bot-side account.
    pub fn bot(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: Role::Bot,
        }
    }
}

/// Reference to the conversation an activity belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRef {
    /// Channel-assigned conversation ID. May carry `|`-delimited suffixes
    /// that transcript bucketing strips off.
    pub id: String,
}

/// A single inbound or outbound event on a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Unique activity ID.
    pub id: Uuid,
    /// Activity kind.
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    /// Message text, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Channel-opaque payload. Carries the end-of-session sentinel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    /// Conversation this activity belongs to.
    pub conversation: ConversationRef,
    /// Sender.
    pub from: ChannelAccount,
    /// Addressee.
    pub recipient: ChannelAccount,
    /// Accounts added to the conversation (conversation updates only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members_added: Vec<ChannelAccount>,
    /// When the activity was created.
    pub timestamp: DateTime<Utc>,
}

impl Activity {
    /// Create a message activity.
    pub fn message(
        conversation: impl Into<String>,
        from: ChannelAccount,
        recipient: ChannelAccount,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ActivityKind::Message,
            text: Some(text.into()),
            value: None,
            conversation: ConversationRef {
                id: conversation.into(),
            },
            from,
            recipient,
            members_added: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Create a membership update announcing newly added members.
    pub fn members_added(
        conversation: impl Into<String>,
        members: Vec<ChannelAccount>,
        from: ChannelAccount,
        recipient: ChannelAccount,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ActivityKind::ConversationUpdate,
            text: None,
            value: None,
            conversation: ConversationRef {
                id: conversation.into(),
            },
            from,
            recipient,
            members_added: members,
            timestamp: Utc::now(),
        }
    }

    /// Create a reply addressed back at this activity's sender, on the same
    /// conversation.
    pub fn reply(&self, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ActivityKind::Message,
            text: Some(text.into()),
            value: None,
            conversation: self.conversation.clone(),
            from: self.recipient.clone(),
            recipient: self.from.clone(),
            members_added: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Attach a payload value.
    pub fn with_value(mut self, value: serde_json::Value) -> Self {
        self.value = Some(value);
        self
    }

    /// Whether this activity carries the end-of-session sentinel.
    pub fn is_end_of_session(&self) -> bool {
        self.value
            .as_ref()
            .and_then(|v| v.as_str())
            .is_some_and(|v| v == END_OF_INPUT)
    }
}
