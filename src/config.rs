//! Runtime configuration.

use crate::error::ConfigError;

/// Schedule entries read out per page.
pub const DEFAULT_WINDOW_SIZE: usize = 3;

/// Which dialog the bot starts when a message arrives with no dialog active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryMode {
    /// Offer to read the calendar schedule aloud.
    #[default]
    Schedule,
    /// Collect a user profile, then summarize it on later messages.
    Profile,
}

/// Bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Display name stamped on outbound activities.
    pub bot_name: String,
    /// How many schedule entries each page reads out.
    pub window_size: usize,
    /// Utterance that interrupts and cancels the active dialog.
    pub cancel_keyword: String,
    /// Dialog entered when no dialog is active.
    pub entry: EntryMode,
    /// Greeting sent to members joining the conversation.
    pub greeting: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot_name: "cal-assist".to_string(),
            window_size: DEFAULT_WINDOW_SIZE,
            cancel_keyword: "cancel".to_string(),
            entry: EntryMode::Schedule,
            greeting: default_greeting(),
        }
    }
}

impl BotConfig {
    /// Builds a config from `CAL_ASSIST_*` environment variables, falling
    /// back to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(name) = std::env::var("CAL_ASSIST_BOT_NAME") {
            config.bot_name = name;
        }

        config.window_size = std::env::var("CAL_ASSIST_WINDOW_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_WINDOW_SIZE);
        // A zero-width window would page forever without ever exhausting.
        if config.window_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "CAL_ASSIST_WINDOW_SIZE".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if let Ok(keyword) = std::env::var("CAL_ASSIST_CANCEL_KEYWORD") {
            config.cancel_keyword = keyword.trim().to_lowercase();
        }

        if let Ok(mode) = std::env::var("CAL_ASSIST_ENTRY") {
            config.entry = match mode.trim().to_lowercase().as_str() {
                "schedule" => EntryMode::Schedule,
                "profile" => EntryMode::Profile,
                other => {
                    return Err(ConfigError::InvalidValue {
                        key: "CAL_ASSIST_ENTRY".to_string(),
                        message: format!("unknown entry mode {other:?}, expected schedule or profile"),
                    });
                }
            };
        }

        if let Ok(greeting) = std::env::var("CAL_ASSIST_GREETING") {
            config.greeting = greeting;
        }

        Ok(config)
    }
}

fn default_greeting() -> String {
    [
        "I am a bot that reads your calendar schedule back to you, a few entries at a time,",
        "and keeps a log of our conversation.",
        "When the session ends you will find your side of the conversation in the transcript file.",
        "Say anything to begin.",
    ]
    .join(" ")
}
