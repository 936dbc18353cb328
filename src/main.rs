use std::sync::Arc;

use futures::StreamExt;

use cal_assist::bot::ScheduleBot;
use cal_assist::channels::{ConsoleChannel, ConsoleSink};
use cal_assist::config::BotConfig;
use cal_assist::context::ActivitySink;
use cal_assist::schedule::{InMemorySchedule, JsonFileSchedule, ScheduleProvider};
use cal_assist::state::{LibSqlStore, MemoryStore, SessionStore};
use cal_assist::transcript::{FileSink, TranscriptLogger, TranscriptSink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = BotConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    eprintln!("📅 {} v{}", config.bot_name, env!("CARGO_PKG_VERSION"));

    // ── Schedule source ──────────────────────────────────────────────────
    let provider: Arc<dyn ScheduleProvider> = match std::env::var("CAL_ASSIST_SCHEDULE") {
        Ok(path) => {
            eprintln!("   Schedule: {path}");
            Arc::new(JsonFileSchedule::new(path))
        }
        Err(_) => {
            eprintln!("   Schedule: built-in sample");
            Arc::new(InMemorySchedule::sample())
        }
    };

    // ── State store ──────────────────────────────────────────────────────
    let store: Arc<dyn SessionStore> = match std::env::var("CAL_ASSIST_DB_PATH") {
        Ok(path) => {
            let store = LibSqlStore::new_local(std::path::Path::new(&path))
                .await
                .unwrap_or_else(|e| {
                    eprintln!("Error: Failed to open state database at {path}: {e}");
                    std::process::exit(1);
                });
            eprintln!("   State: {path}");
            Arc::new(store)
        }
        Err(_) => {
            eprintln!("   State: in-memory");
            Arc::new(MemoryStore::new())
        }
    };

    // ── Transcripts ──────────────────────────────────────────────────────
    let transcript_path = std::env::var("CAL_ASSIST_TRANSCRIPT_PATH")
        .unwrap_or_else(|_| "./transcripts/transcript.log".to_string());
    eprintln!("   Transcripts: {transcript_path}");
    eprintln!("   Type a message and press Enter. Say 'cancel' to interrupt.\n");
    let transcript =
        TranscriptLogger::new(Arc::new(FileSink::new(&transcript_path)) as Arc<dyn TranscriptSink>);

    let bot_name = config.bot_name.clone();
    let bot = ScheduleBot::new(config, store, provider, transcript);

    // ── Console loop ─────────────────────────────────────────────────────
    let channel = ConsoleChannel::new(bot_name);
    let console: Arc<dyn ActivitySink> = Arc::new(ConsoleSink);

    // Run the join through the bot first so the greeting fires before any
    // input is read.
    bot.on_turn(channel.join_activity(), Arc::clone(&console))
        .await?;

    let mut activities = channel.start();
    while let Some(activity) = activities.next().await {
        // A failed turn is logged and the loop keeps going; dialog state
        // was committed up to the last successful step, so the user can
        // simply answer again.
        if let Err(e) = bot.on_turn(activity, Arc::clone(&console)).await {
            tracing::error!(error = %e, "Turn failed");
        }
    }

    Ok(())
}
