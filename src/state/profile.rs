//! Per-user reading progress and profile fields.

use serde::{Deserialize, Serialize};

/// Everything the bot remembers about a user, across conversations.
///
/// Reading progress lives here rather than in conversation state, so a user
/// who resumes in a new conversation picks up where their cursor left off.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    /// Index of the last schedule entry read out to this user.
    pub entry_read: i64,
    /// True while a schedule read-out is in progress.
    pub start_reading: bool,
    /// True once the user has asked to keep paging past the first entry.
    pub loop_flag: bool,
    /// Self-reported name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Self-reported age.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
}
