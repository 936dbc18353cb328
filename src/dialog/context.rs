//! Waterfall dialog engine.
//!
//! A flow is a fixed sequence of steps. Steps run one after another within
//! a single turn until one suspends on a prompt; the recognized reply
//! arrives as the *next* step's result on a later turn. Flows can push
//! child flows, replace themselves (the loop primitive), or end and hand a
//! result to whatever is beneath them on the stack.
//!
//! Frames commit only after a step succeeds. A step that fails leaves its
//! frame exactly as it was, so the turn can be retried without the dialog
//! losing its place.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::activity::Activity;
use crate::context::TurnContext;
use crate::dialog::state::{
    DialogFrame, DialogStack, PendingPrompt, PromptKind, Recognition, render_choices,
};
use crate::error::DialogError;
use crate::state::UserProfile;

/// What a waterfall step tells the engine to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum StepAction {
    /// Suspend on the prompt issued during this step and yield the turn.
    Wait,
    /// Fall through to the next step immediately, handing it this value.
    Next(serde_json::Value),
    /// Push the named flow; this flow resumes at its next step once the
    /// child ends.
    Begin(String),
    /// Tear down this flow and restart the named one in its place. A flow
    /// replacing itself is the loop primitive.
    Replace(String),
    /// End this flow, handing the result to the flow beneath it.
    End(Option<serde_json::Value>),
}

/// Knobs for a number prompt.
#[derive(Debug, Clone, Default)]
pub struct NumberPromptOptions {
    /// Sent instead of the original prompt when input does not parse.
    pub retry_prompt: Option<String>,
    /// Parsed values at or below this bound are rejected.
    pub min_exclusive: Option<i64>,
    /// Sent before the retry text when the bound rejects a value.
    pub below_min_message: Option<String>,
}

/// A registered waterfall dialog.
#[async_trait]
pub trait Flow: Send + Sync {
    /// Stable id this flow registers and is begun under.
    fn id(&self) -> &'static str;

    /// Number of steps. Running past the last step ends the flow
    /// implicitly, cascading the current result to the parent.
    fn step_count(&self) -> usize;

    /// Run one step.
    async fn run_step(
        &self,
        index: usize,
        step: &mut StepContext<'_>,
    ) -> Result<StepAction, DialogError>;
}

/// What one waterfall step can see and do.
pub struct StepContext<'a> {
    turn: &'a mut TurnContext,
    profile: &'a mut UserProfile,
    result: Option<serde_json::Value>,
    issued: Option<PendingPrompt>,
}

impl<'a> StepContext<'a> {
    fn new(
        turn: &'a mut TurnContext,
        profile: &'a mut UserProfile,
        result: Option<serde_json::Value>,
    ) -> Self {
        Self {
            turn,
            profile,
            result,
            issued: None,
        }
    }

    /// The value handed to this step: a recognized prompt reply, a child
    /// flow's result, or whatever the previous step passed to `Next`.
    pub fn result(&self) -> Option<&serde_json::Value> {
        self.result.as_ref()
    }

    /// The step result as a string, if it is one.
    pub fn result_str(&self) -> Option<&str> {
        self.result.as_ref().and_then(|v| v.as_str())
    }

    /// The step result as an integer, if it is one.
    pub fn result_i64(&self) -> Option<i64> {
        self.result.as_ref().and_then(|v| v.as_i64())
    }

    /// The user profile, mutable for the duration of the turn.
    pub fn profile(&mut self) -> &mut UserProfile {
        self.profile
    }

    /// Build a reply activity without sending it.
    pub fn reply(&self, text: impl Into<String>) -> Activity {
        self.turn.activity().reply(text)
    }

    /// Send a plain text reply.
    pub async fn send_text(&mut self, text: impl Into<String>) -> Result<(), DialogError> {
        self.turn.send_text(text).await.map_err(DialogError::from)
    }

    /// Send a fully built activity.
    pub async fn send(&mut self, activity: Activity) -> Result<(), DialogError> {
        self.turn.send(activity).await.map_err(DialogError::from)
    }

    /// Ask a free-text question and suspend.
    pub async fn prompt_text(&mut self, id: &str, text: &str) -> Result<StepAction, DialogError> {
        self.send_text(text).await?;
        self.issued = Some(PendingPrompt {
            id: id.to_string(),
            text: text.to_string(),
            kind: PromptKind::Text,
        });
        Ok(StepAction::Wait)
    }

    /// Ask the user to pick one of `choices` and suspend. The prompt is
    /// rendered with the choices appended so a retry repeats them.
    pub async fn prompt_choice(
        &mut self,
        id: &str,
        text: &str,
        choices: &[&str],
    ) -> Result<StepAction, DialogError> {
        let choices: Vec<String> = choices.iter().map(|c| c.to_lowercase()).collect();
        let rendered = render_choices(text, &choices);
        self.send_text(rendered.clone()).await?;
        self.issued = Some(PendingPrompt {
            id: id.to_string(),
            text: rendered,
            kind: PromptKind::Choice { choices },
        });
        Ok(StepAction::Wait)
    }

    /// Ask for an integer and suspend.
    pub async fn prompt_number(
        &mut self,
        id: &str,
        text: &str,
        options: NumberPromptOptions,
    ) -> Result<StepAction, DialogError> {
        self.send_text(text).await?;
        self.issued = Some(PendingPrompt {
            id: id.to_string(),
            text: text.to_string(),
            kind: PromptKind::Number {
                retry_prompt: options.retry_prompt,
                min_exclusive: options.min_exclusive,
                below_min_message: options.below_min_message,
            },
        });
        Ok(StepAction::Wait)
    }
}

/// Registry of every flow the bot can run.
#[derive(Default)]
pub struct DialogSet {
    flows: HashMap<&'static str, Arc<dyn Flow>>,
}

impl DialogSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a flow under its own id.
    pub fn add(&mut self, flow: Arc<dyn Flow>) {
        self.flows.insert(flow.id(), flow);
    }

    fn get(&self, id: &str) -> Result<Arc<dyn Flow>, DialogError> {
        self.flows
            .get(id)
            .cloned()
            .ok_or_else(|| DialogError::UnknownFlow(id.to_string()))
    }

    /// Bind this registry to one turn's context and state.
    pub fn create_context<'a>(
        &'a self,
        turn: &'a mut TurnContext,
        stack: &'a mut DialogStack,
        profile: &'a mut UserProfile,
    ) -> DialogContext<'a> {
        DialogContext {
            flows: self,
            turn,
            stack,
            profile,
        }
    }
}

/// One turn's view of the dialog stack.
pub struct DialogContext<'a> {
    flows: &'a DialogSet,
    turn: &'a mut TurnContext,
    stack: &'a mut DialogStack,
    profile: &'a mut UserProfile,
}

impl DialogContext<'_> {
    /// Whether any dialog is on the stack.
    pub fn active(&self) -> bool {
        !self.stack.is_empty()
    }

    /// Whether this turn has delivered anything yet.
    pub fn responded(&self) -> bool {
        self.turn.responded()
    }

    /// Read access to the user profile.
    pub fn profile(&self) -> &UserProfile {
        self.profile
    }

    /// Send a plain text reply outside any flow.
    pub async fn send_text(&mut self, text: impl Into<String>) -> Result<(), DialogError> {
        self.turn.send_text(text).await.map_err(DialogError::from)
    }

    /// Push `flow_id` onto the stack and run it until it suspends or the
    /// stack empties.
    pub async fn begin_dialog(&mut self, flow_id: &str) -> Result<(), DialogError> {
        self.flows.get(flow_id)?;
        debug!(flow = flow_id, "Beginning dialog");
        self.stack.push(DialogFrame::new(flow_id));
        self.drive(None).await
    }

    /// Feed the turn's message to the suspended prompt, if any. A turn
    /// with nothing suspended is a no-op; an unrecognized reply re-sends
    /// the prompt and stays suspended.
    pub async fn continue_dialog(&mut self) -> Result<(), DialogError> {
        let Some(pending) = self.stack.top().and_then(|f| f.awaiting.clone()) else {
            return Ok(());
        };
        let input = self.turn.activity().text.clone().unwrap_or_default();
        match pending.recognize(&input) {
            Recognition::Recognized(value) => {
                debug!(prompt = %pending.id, "Prompt reply recognized");
                self.drive(Some(value)).await
            }
            Recognition::Retry(messages) => {
                debug!(prompt = %pending.id, "Prompt reply not recognized, re-prompting");
                for message in messages {
                    self.turn.send_text(message).await?;
                }
                Ok(())
            }
        }
    }

    /// End the top dialog from outside a step, cascading `result` to the
    /// flow beneath it.
    pub async fn end_dialog(
        &mut self,
        result: Option<serde_json::Value>,
    ) -> Result<(), DialogError> {
        if self.stack.pop().is_some() {
            self.drive(result).await
        } else {
            Ok(())
        }
    }

    /// Drop every frame. Returns how many were dropped.
    pub fn cancel_all_dialogs(&mut self) -> usize {
        let depth = self.stack.depth();
        self.stack.clear();
        if depth > 0 {
            debug!(frames = depth, "Cancelled all dialogs");
        }
        depth
    }

    /// Run steps until one suspends or the stack empties. `input` seeds
    /// the first step's result and is then replaced by whatever each
    /// action carries.
    async fn drive(&mut self, mut input: Option<serde_json::Value>) -> Result<(), DialogError> {
        loop {
            let (flow_id, index) = match self.stack.top() {
                Some(frame) => (frame.flow_id.clone(), frame.step),
                None => return Ok(()),
            };
            let flow = self.flows.get(&flow_id)?;

            if index >= flow.step_count() {
                // Ran past the last step: the flow ends implicitly and its
                // result keeps cascading down the stack.
                self.stack.pop();
                continue;
            }

            let mut step = StepContext::new(self.turn, self.profile, input.take());
            let action = flow.run_step(index, &mut step).await?;
            let issued = step.issued;

            match action {
                StepAction::Wait => {
                    let pending = issued.ok_or_else(|| DialogError::MissingPrompt {
                        flow: flow_id.clone(),
                        step: index,
                    })?;
                    debug!(flow = %flow_id, prompt = %pending.id, "Dialog suspended on prompt");
                    if let Some(frame) = self.stack.top_mut() {
                        frame.step = index + 1;
                        frame.awaiting = Some(pending);
                    }
                    return Ok(());
                }
                StepAction::Next(value) => {
                    if let Some(frame) = self.stack.top_mut() {
                        frame.step = index + 1;
                        frame.awaiting = None;
                    }
                    input = Some(value);
                }
                StepAction::Begin(child) => {
                    self.flows.get(&child)?;
                    if let Some(frame) = self.stack.top_mut() {
                        frame.step = index + 1;
                        frame.awaiting = None;
                    }
                    debug!(parent = %flow_id, child = %child, "Beginning child dialog");
                    self.stack.push(DialogFrame::new(child));
                }
                StepAction::Replace(next) => {
                    self.flows.get(&next)?;
                    debug!(from = %flow_id, to = %next, "Replacing dialog");
                    self.stack.pop();
                    self.stack.push(DialogFrame::new(next));
                }
                StepAction::End(result) => {
                    debug!(flow = %flow_id, "Dialog ended");
                    self.stack.pop();
                    input = result;
                }
            }
        }
    }
}
