//! Error types for cal-assist.

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Dialog error: {0}")]
    Dialog(#[from] DialogError),

    #[error("Schedule provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("State store error: {0}")]
    Store(#[from] StoreError),

    #[error("Transcript error: {0}")]
    Transcript(#[from] TranscriptError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
}

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Dialog-engine errors.
#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    #[error("No dialog registered under id {0}")]
    UnknownFlow(String),

    #[error("Dialog {flow} step {step} suspended without issuing a prompt")]
    MissingPrompt { flow: String, step: usize },

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Schedule provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Schedule source errors.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Failed to read schedule source: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed schedule data: {0}")]
    Malformed(String),

    #[error("Schedule entry {index} out of range (total {total})")]
    OutOfRange { index: i64, total: i64 },
}

/// State persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("State serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Transcript logging errors.
#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("Activity carries no conversation id")]
    MissingConversation,

    #[error("Transcript sink IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transcript serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Delivery errors raised by outbound channels.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Failed to deliver activity: {0}")]
    Deliver(String),
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
