//! Turn dispatcher — routes each inbound activity through the dialog
//! engine and persists state on the way out.
//!
//! **Core invariant: both state scopes are saved after every turn,
//! whatever the dispatch did.** A failed step leaves the stack where the
//! previous turn committed it, so the next activity retries from there.
//!
//! Flow:
//! 1. Log the inbound activity to the transcript
//! 2. Load the user profile and the conversation's dialog stack
//! 3. Dispatch by activity kind (message vs. member join)
//! 4. Stage and save both scopes, surfacing the dispatch error first

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::activity::{Activity, ActivityKind};
use crate::config::{BotConfig, EntryMode};
use crate::context::{ActivitySink, TurnContext};
use crate::dialog::flows::{
    HELLO_USER, MAY_I_HELP, ProfileFlow, ProfileSummaryFlow, ScheduleFlow, ScheduleLoopFlow,
    WHO_ARE_YOU,
};
use crate::dialog::{DialogSet, DialogStack};
use crate::error::Result;
use crate::schedule::{SchedulePager, ScheduleProvider};
use crate::state::{BotState, SessionStore, UserProfile};
use crate::transcript::TranscriptLogger;

const CANCELED: &str = "Ok... canceled.";
const NOTHING_TO_CANCEL: &str = "Nothing to cancel.";

/// The bot. Owns the dialog registry, both state scopes, and the
/// transcript logger; one instance serves every conversation.
pub struct ScheduleBot {
    config: BotConfig,
    dialogs: DialogSet,
    user_state: BotState<UserProfile>,
    conversation_state: BotState<DialogStack>,
    transcript: Arc<TranscriptLogger>,
}

impl ScheduleBot {
    /// Wire up the bot: register the calendar and profile flows over a
    /// shared pager and point both state scopes at `store`.
    pub fn new(
        config: BotConfig,
        store: Arc<dyn SessionStore>,
        provider: Arc<dyn ScheduleProvider>,
        transcript: Arc<TranscriptLogger>,
    ) -> Self {
        let pager = Arc::new(SchedulePager::new(provider, config.window_size));

        let mut dialogs = DialogSet::new();
        dialogs.add(Arc::new(ScheduleFlow::new(Arc::clone(&pager))));
        dialogs.add(Arc::new(ScheduleLoopFlow::new(pager)));
        dialogs.add(Arc::new(ProfileFlow));
        dialogs.add(Arc::new(ProfileSummaryFlow));

        Self {
            config,
            dialogs,
            user_state: BotState::new(Arc::clone(&store), "users"),
            conversation_state: BotState::new(store, "conversations"),
            transcript,
        }
    }

    /// Run one full turn for `activity`, replying through `sink`.
    ///
    /// State is staged and saved even when the dispatch fails; the dispatch
    /// error is surfaced ahead of any save error.
    pub async fn on_turn(&self, activity: Activity, sink: Arc<dyn ActivitySink>) -> Result<()> {
        if let Err(e) = self.transcript.log_activity(&activity).await {
            warn!(error = %e, "Failed to log inbound activity");
        }

        let user_key = activity.from.id.clone();
        let conversation_key = activity.conversation.id.clone();
        debug!(
            kind = activity.kind.as_str(),
            user = %user_key,
            conversation = %conversation_key,
            "Turn started"
        );

        let mut profile = self.user_state.get(&user_key).await?;
        let mut stack = self.conversation_state.get(&conversation_key).await?;

        let mut turn = TurnContext::new(activity, sink, Arc::clone(&self.transcript));
        let turn_result = self.dispatch(&mut turn, &mut stack, &mut profile).await;

        self.user_state.set(&user_key, profile).await;
        self.conversation_state.set(&conversation_key, stack).await;
        let user_save = self.user_state.save_changes(&user_key).await;
        let conversation_save = self.conversation_state.save_changes(&conversation_key).await;

        turn_result?;
        user_save?;
        conversation_save?;
        Ok(())
    }

    async fn dispatch(
        &self,
        turn: &mut TurnContext,
        stack: &mut DialogStack,
        profile: &mut UserProfile,
    ) -> Result<()> {
        match turn.activity().kind {
            ActivityKind::Message => self.on_message(turn, stack, profile).await,
            ActivityKind::ConversationUpdate => self.on_members_added(turn).await,
        }
    }

    /// Message dispatch: cancel interrupt first, then resume whatever is
    /// active, then fall back to the configured entry dialog.
    async fn on_message(
        &self,
        turn: &mut TurnContext,
        stack: &mut DialogStack,
        profile: &mut UserProfile,
    ) -> Result<()> {
        let utterance = turn
            .activity()
            .text
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        let mut dc = self.dialogs.create_context(turn, stack, profile);

        // The cancel keyword interrupts no matter what is active, and the
        // turn ends there.
        if utterance == self.config.cancel_keyword {
            if dc.cancel_all_dialogs() > 0 {
                info!("Active dialogs canceled by user");
                dc.send_text(CANCELED).await?;
            } else {
                dc.send_text(NOTHING_TO_CANCEL).await?;
            }
            return Ok(());
        }

        dc.continue_dialog().await?;

        // Nothing was resumed, so this message opens a fresh dialog.
        if !dc.responded() {
            match self.config.entry {
                EntryMode::Schedule => dc.begin_dialog(MAY_I_HELP).await?,
                EntryMode::Profile => {
                    if dc.profile().name.is_some() {
                        dc.begin_dialog(HELLO_USER).await?;
                    } else {
                        dc.begin_dialog(WHO_ARE_YOU).await?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Greet every member the channel added, except the bot itself.
    async fn on_members_added(&self, turn: &mut TurnContext) -> Result<()> {
        let recipient_id = turn.activity().recipient.id.clone();
        let members = turn.activity().members_added.clone();
        for member in members {
            if member.id != recipient_id {
                debug!(member = %member.id, "Greeting new member");
                turn.send_text(self.config.greeting.clone()).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ChannelAccount;
    use crate::context::CollectingSink;
    use crate::schedule::InMemorySchedule;
    use crate::state::MemoryStore;
    use crate::transcript::{MemorySink, TranscriptSink};

    fn test_bot(config: BotConfig, store: Arc<MemoryStore>) -> ScheduleBot {
        let transcript =
            TranscriptLogger::new(Arc::new(MemorySink::new()) as Arc<dyn TranscriptSink>);
        ScheduleBot::new(
            config,
            store as Arc<dyn SessionStore>,
            Arc::new(InMemorySchedule::sample()),
            transcript,
        )
    }

    fn message(text: &str) -> Activity {
        Activity::message(
            "conv-1",
            ChannelAccount::user("user-1", "User"),
            ChannelAccount::bot("bot-1", "Bot"),
            text,
        )
    }

    #[tokio::test]
    async fn join_greets_users_but_not_the_bot() {
        let bot = test_bot(BotConfig::default(), Arc::new(MemoryStore::new()));
        let sink = Arc::new(CollectingSink::new());

        let join = Activity::members_added(
            "conv-1",
            vec![
                ChannelAccount::bot("bot-1", "Bot"),
                ChannelAccount::user("user-1", "User"),
            ],
            ChannelAccount::user("user-1", "User"),
            ChannelAccount::bot("bot-1", "Bot"),
        );
        bot.on_turn(join, Arc::clone(&sink) as Arc<dyn ActivitySink>)
            .await
            .unwrap();

        let out = sink.drain_texts().await;
        assert_eq!(out.len(), 1, "only the human member is greeted");
        assert_eq!(out[0], BotConfig::default().greeting);
    }

    #[tokio::test]
    async fn cancel_with_nothing_active_says_so() {
        let bot = test_bot(BotConfig::default(), Arc::new(MemoryStore::new()));
        let sink = Arc::new(CollectingSink::new());

        bot.on_turn(message("cancel"), Arc::clone(&sink) as Arc<dyn ActivitySink>)
            .await
            .unwrap();

        assert_eq!(sink.drain_texts().await, ["Nothing to cancel."]);
    }

    #[tokio::test]
    async fn cancel_tears_down_an_active_dialog() {
        let bot = test_bot(BotConfig::default(), Arc::new(MemoryStore::new()));
        let sink = Arc::new(CollectingSink::new());

        bot.on_turn(message("hi"), Arc::clone(&sink) as Arc<dyn ActivitySink>)
            .await
            .unwrap();
        sink.drain().await;

        bot.on_turn(message("cancel"), Arc::clone(&sink) as Arc<dyn ActivitySink>)
            .await
            .unwrap();
        assert_eq!(sink.drain_texts().await, ["Ok... canceled."]);

        // The next message starts over instead of resuming the old prompt.
        bot.on_turn(message("hello again"), Arc::clone(&sink) as Arc<dyn ActivitySink>)
            .await
            .unwrap();
        assert_eq!(
            sink.drain_texts().await,
            ["Shall we begin by reading your calendar? (yes or no)"]
        );
    }

    #[tokio::test]
    async fn profile_entry_picks_interview_then_summary() {
        let config = BotConfig {
            entry: EntryMode::Profile,
            ..BotConfig::default()
        };
        let store = Arc::new(MemoryStore::new());
        let bot = test_bot(config, Arc::clone(&store));
        let sink = Arc::new(CollectingSink::new());

        for text in ["hi", "Ada", "no"] {
            bot.on_turn(message(text), Arc::clone(&sink) as Arc<dyn ActivitySink>)
                .await
                .unwrap();
        }
        sink.drain().await;

        // The interview finished, so the next message replays the profile.
        bot.on_turn(message("hello"), Arc::clone(&sink) as Arc<dyn ActivitySink>)
            .await
            .unwrap();
        assert_eq!(
            sink.drain_texts().await,
            ["Your name is Ada and you did not share your age."]
        );
    }

    #[tokio::test]
    async fn state_survives_a_bot_restart() {
        let store = Arc::new(MemoryStore::new());
        let sink = Arc::new(CollectingSink::new());

        {
            let bot = test_bot(BotConfig::default(), Arc::clone(&store));
            bot.on_turn(message("hi"), Arc::clone(&sink) as Arc<dyn ActivitySink>)
                .await
                .unwrap();
            sink.drain().await;
        }

        // A fresh bot over the same store resumes the suspended prompt.
        let bot = test_bot(BotConfig::default(), Arc::clone(&store));
        bot.on_turn(message("yes"), Arc::clone(&sink) as Arc<dyn ActivitySink>)
            .await
            .unwrap();
        let out = sink.drain_texts().await;
        assert!(
            out.first().is_some_and(|t| t.starts_with("on Monday")),
            "resumed dialog read the first entry, got {out:?}"
        );
    }
}
