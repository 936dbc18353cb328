//! cal-assist — a calendar read-out bot with dialog state and transcripts.

pub mod activity;
pub mod bot;
pub mod channels;
pub mod config;
pub mod context;
pub mod dialog;
pub mod error;
pub mod schedule;
pub mod state;
pub mod transcript;
