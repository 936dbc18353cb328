//! Calendar read-out dialogs.
//!
//! `may_i_help` opens the conversation: it offers to read the schedule,
//! reads the first entry, and asks whether to keep going. Saying yes hands
//! off to `loop_calendar`, which pages through the rest a window at a time
//! and loops by replacing itself until the user declines or the schedule
//! runs out.

use std::sync::Arc;

use async_trait::async_trait;

use crate::dialog::context::{Flow, StepAction, StepContext};
use crate::error::DialogError;
use crate::schedule::{SchedulePager, ScheduleRecord};

pub const MAY_I_HELP: &str = "may_i_help";
pub const LOOP_CALENDAR: &str = "loop_calendar";

const START_PROMPT: &str = "start_prompt";
const NEXT_PROMPT: &str = "next_prompt";

const YES: &str = "yes";
const NO: &str = "no";

const ASK_START: &str = "Shall we begin by reading your calendar?";
const ASK_NEXT: &str = "Continue to next item?";
const EMPTY_SCHEDULE: &str = "You have no schedule in your calendar, call me when you need me.";
const NO_MORE_SCHEDULE: &str = "No more schedule in your calendar, call me when you need me.";
const DECLINED: &str = "Understand, just call me when you want";

/// Read each record out as its own message.
async fn send_records(
    step: &mut StepContext<'_>,
    records: &[ScheduleRecord],
) -> Result<(), DialogError> {
    for record in records {
        step.send_text(record.to_string()).await?;
    }
    Ok(())
}

/// Opening dialog: offer the read-out, read the first entry, hand off to
/// the paging loop.
pub struct ScheduleFlow {
    pager: Arc<SchedulePager>,
}

impl ScheduleFlow {
    pub fn new(pager: Arc<SchedulePager>) -> Self {
        Self { pager }
    }

    // Prompts the user to start.
    async fn prompt_for_start(
        &self,
        step: &mut StepContext<'_>,
    ) -> Result<StepAction, DialogError> {
        step.prompt_choice(START_PROMPT, ASK_START, &[YES, NO]).await
    }

    // Captures the user's intent to read the calendar and reads the first
    // entry, or bows out when the schedule is empty.
    async fn confirm_start(&self, step: &mut StepContext<'_>) -> Result<StepAction, DialogError> {
        match step.result_str() {
            Some(YES) => {
                {
                    let profile = step.profile();
                    profile.entry_read = 0;
                    profile.start_reading = true;
                }
                if self.pager.is_empty().await? {
                    step.send_text(EMPTY_SCHEDULE).await?;
                    step.profile().start_reading = false;
                    return Ok(StepAction::End(None));
                }
                let first = self.pager.advance_by(-1, 1).await?;
                send_records(step, &first.records).await?;
                step.profile().entry_read = first.cursor;
                step.prompt_choice(NEXT_PROMPT, ASK_NEXT, &[YES, NO]).await
            }
            _ => {
                step.send_text(DECLINED).await?;
                Ok(StepAction::End(None))
            }
        }
    }

    // Captures the user's intent to keep reading, starting the loop.
    async fn confirm_next(&self, step: &mut StepContext<'_>) -> Result<StepAction, DialogError> {
        match step.result_str() {
            Some(YES) => {
                step.profile().loop_flag = true;
                Ok(StepAction::Begin(LOOP_CALENDAR.to_string()))
            }
            _ => {
                step.send_text(DECLINED).await?;
                Ok(StepAction::End(None))
            }
        }
    }
}

#[async_trait]
impl Flow for ScheduleFlow {
    fn id(&self) -> &'static str {
        MAY_I_HELP
    }

    fn step_count(&self) -> usize {
        3
    }

    async fn run_step(
        &self,
        index: usize,
        step: &mut StepContext<'_>,
    ) -> Result<StepAction, DialogError> {
        match index {
            0 => self.prompt_for_start(step).await,
            1 => self.confirm_start(step).await,
            2 => self.confirm_next(step).await,
            _ => Ok(StepAction::End(None)),
        }
    }
}

/// Paging loop: read the next window, then either replace itself to keep
/// going or end when the user declines or the schedule is exhausted.
pub struct ScheduleLoopFlow {
    pager: Arc<SchedulePager>,
}

impl ScheduleLoopFlow {
    pub fn new(pager: Arc<SchedulePager>) -> Self {
        Self { pager }
    }

    // Reads the next window of entries from where the user's cursor left
    // off. An exhausted window keeps the stored cursor where it was.
    async fn read_window(&self, step: &mut StepContext<'_>) -> Result<StepAction, DialogError> {
        let advance = self.pager.advance(step.profile().entry_read).await?;
        send_records(step, &advance.records).await?;
        if advance.exhausted {
            step.profile().start_reading = false;
            step.send_text(NO_MORE_SCHEDULE).await?;
            return Ok(StepAction::End(None));
        }
        step.profile().entry_read = advance.cursor;
        step.prompt_choice(NEXT_PROMPT, ASK_NEXT, &[YES, NO]).await
    }

    // Captures the user's intent to read the next window.
    async fn confirm_continue(
        &self,
        step: &mut StepContext<'_>,
    ) -> Result<StepAction, DialogError> {
        match step.result_str() {
            Some(YES) => Ok(StepAction::Replace(LOOP_CALENDAR.to_string())),
            _ => {
                step.send_text(DECLINED).await?;
                Ok(StepAction::End(None))
            }
        }
    }
}

#[async_trait]
impl Flow for ScheduleLoopFlow {
    fn id(&self) -> &'static str {
        LOOP_CALENDAR
    }

    fn step_count(&self) -> usize {
        2
    }

    async fn run_step(
        &self,
        index: usize,
        step: &mut StepContext<'_>,
    ) -> Result<StepAction, DialogError> {
        match index {
            0 => self.read_window(step).await,
            1 => self.confirm_continue(step).await,
            _ => Ok(StepAction::End(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{Activity, ChannelAccount};
    use crate::context::{ActivitySink, CollectingSink, TurnContext};
    use crate::dialog::context::DialogSet;
    use crate::dialog::state::DialogStack;
    use crate::schedule::InMemorySchedule;
    use crate::state::UserProfile;
    use crate::transcript::{MemorySink, TranscriptLogger, TranscriptSink};

    fn records(n: usize) -> Vec<ScheduleRecord> {
        (0..n)
            .map(|i| ScheduleRecord::new(format!("day-{i}"), "10:00", format!("event-{i}")))
            .collect()
    }

    fn flow_set(total: usize) -> DialogSet {
        let pager = Arc::new(SchedulePager::new(
            Arc::new(InMemorySchedule::new(records(total))),
            3,
        ));
        let mut set = DialogSet::new();
        set.add(Arc::new(ScheduleFlow::new(Arc::clone(&pager))));
        set.add(Arc::new(ScheduleLoopFlow::new(pager)));
        set
    }

    async fn run_turn(
        set: &DialogSet,
        sink: &Arc<CollectingSink>,
        stack: &mut DialogStack,
        profile: &mut UserProfile,
        text: &str,
    ) -> Vec<String> {
        let inbound = Activity::message(
            "conv-s",
            ChannelAccount::user("u1", "User"),
            ChannelAccount::bot("b1", "Bot"),
            text,
        );
        let transcript =
            TranscriptLogger::new(Arc::new(MemorySink::new()) as Arc<dyn TranscriptSink>);
        let mut turn =
            TurnContext::new(inbound, Arc::clone(sink) as Arc<dyn ActivitySink>, transcript);
        let mut dc = set.create_context(&mut turn, stack, profile);
        if dc.active() {
            dc.continue_dialog().await.unwrap();
        } else {
            dc.begin_dialog(MAY_I_HELP).await.unwrap();
        }
        sink.drain_texts().await
    }

    #[tokio::test]
    async fn two_entry_schedule_reads_out_and_finishes() {
        let set = flow_set(2);
        let sink = Arc::new(CollectingSink::new());
        let mut stack = DialogStack::default();
        let mut profile = UserProfile::default();

        let out = run_turn(&set, &sink, &mut stack, &mut profile, "hi").await;
        assert_eq!(out, ["Shall we begin by reading your calendar? (yes or no)"]);

        let out = run_turn(&set, &sink, &mut stack, &mut profile, "yes").await;
        assert_eq!(
            out,
            [
                "on day-0 at 10:00 you have event-0",
                "Continue to next item? (yes or no)"
            ]
        );
        assert_eq!(profile.entry_read, 0);
        assert!(profile.start_reading);

        let out = run_turn(&set, &sink, &mut stack, &mut profile, "yes").await;
        assert_eq!(
            out,
            [
                "on day-1 at 10:00 you have event-1",
                "No more schedule in your calendar, call me when you need me."
            ]
        );
        assert!(stack.is_empty(), "the whole dialog tree has ended");
        assert!(!profile.start_reading);
        assert!(profile.loop_flag);
        // An exhausted window does not push the cursor forward.
        assert_eq!(profile.entry_read, 0);
    }

    #[tokio::test]
    async fn empty_schedule_bows_out_immediately() {
        let set = flow_set(0);
        let sink = Arc::new(CollectingSink::new());
        let mut stack = DialogStack::default();
        let mut profile = UserProfile::default();

        run_turn(&set, &sink, &mut stack, &mut profile, "hi").await;
        let out = run_turn(&set, &sink, &mut stack, &mut profile, "yes").await;

        assert_eq!(
            out,
            ["You have no schedule in your calendar, call me when you need me."]
        );
        assert!(stack.is_empty());
        assert_eq!(profile.entry_read, 0);
        assert!(!profile.start_reading, "reset after the empty read");
    }

    #[tokio::test]
    async fn declining_at_the_start_ends_politely() {
        let set = flow_set(5);
        let sink = Arc::new(CollectingSink::new());
        let mut stack = DialogStack::default();
        let mut profile = UserProfile::default();

        run_turn(&set, &sink, &mut stack, &mut profile, "hi").await;
        let out = run_turn(&set, &sink, &mut stack, &mut profile, "no").await;

        assert_eq!(out, ["Understand, just call me when you want"]);
        assert!(stack.is_empty());
        assert_eq!(profile, UserProfile::default());
    }

    #[tokio::test]
    async fn loop_pages_three_at_a_time_until_exhausted() {
        let set = flow_set(7);
        let sink = Arc::new(CollectingSink::new());
        let mut stack = DialogStack::default();
        let mut profile = UserProfile::default();

        run_turn(&set, &sink, &mut stack, &mut profile, "hi").await;
        run_turn(&set, &sink, &mut stack, &mut profile, "yes").await;

        // First loop window: entries 1..=3.
        let out = run_turn(&set, &sink, &mut stack, &mut profile, "yes").await;
        assert_eq!(
            out,
            [
                "on day-1 at 10:00 you have event-1",
                "on day-2 at 10:00 you have event-2",
                "on day-3 at 10:00 you have event-3",
                "Continue to next item? (yes or no)"
            ]
        );
        assert_eq!(profile.entry_read, 3);

        // Second window: entries 4..=6, via the loop replacing itself.
        let out = run_turn(&set, &sink, &mut stack, &mut profile, "yes").await;
        assert_eq!(
            out,
            [
                "on day-4 at 10:00 you have event-4",
                "on day-5 at 10:00 you have event-5",
                "on day-6 at 10:00 you have event-6",
                "Continue to next item? (yes or no)"
            ]
        );
        assert_eq!(profile.entry_read, 6);

        // Third window: nothing left.
        let out = run_turn(&set, &sink, &mut stack, &mut profile, "yes").await;
        assert_eq!(
            out,
            ["No more schedule in your calendar, call me when you need me."]
        );
        assert!(stack.is_empty());
        assert_eq!(profile.entry_read, 6, "cursor stays put on exhaustion");
    }

    #[tokio::test]
    async fn declining_mid_loop_keeps_the_cursor_for_later() {
        let set = flow_set(9);
        let sink = Arc::new(CollectingSink::new());
        let mut stack = DialogStack::default();
        let mut profile = UserProfile::default();

        run_turn(&set, &sink, &mut stack, &mut profile, "hi").await;
        run_turn(&set, &sink, &mut stack, &mut profile, "yes").await;
        run_turn(&set, &sink, &mut stack, &mut profile, "yes").await;
        let out = run_turn(&set, &sink, &mut stack, &mut profile, "no").await;

        assert_eq!(out, ["Understand, just call me when you want"]);
        assert!(stack.is_empty());
        // Entries 0..=3 were read; progress survives for a later session.
        assert_eq!(profile.entry_read, 3);
        assert!(profile.start_reading, "a declined loop is not exhaustion");
    }

    #[tokio::test]
    async fn invalid_answer_mid_loop_reprompts_in_place() {
        let set = flow_set(7);
        let sink = Arc::new(CollectingSink::new());
        let mut stack = DialogStack::default();
        let mut profile = UserProfile::default();

        run_turn(&set, &sink, &mut stack, &mut profile, "hi").await;
        run_turn(&set, &sink, &mut stack, &mut profile, "yes").await;
        run_turn(&set, &sink, &mut stack, &mut profile, "yes").await;
        let cursor_before = profile.entry_read;

        let out = run_turn(&set, &sink, &mut stack, &mut profile, "perhaps").await;
        assert_eq!(out, ["Continue to next item? (yes or no)"]);
        assert_eq!(profile.entry_read, cursor_before, "no entries were consumed");

        // A valid answer afterwards picks up exactly where it left off.
        let out = run_turn(&set, &sink, &mut stack, &mut profile, "yes").await;
        assert_eq!(out[0], "on day-4 at 10:00 you have event-4");
    }
}
