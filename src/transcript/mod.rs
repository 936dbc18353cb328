//! Conversation transcripts — per-conversation buffering and flush sinks.

pub mod logger;
pub mod sink;

pub use logger::{TranscriptEntry, TranscriptLogger, conversation_key};
pub use sink::{FileSink, MemorySink, TranscriptSink};
