//! Dialog stack state — waterfall frames and suspended prompts.
//!
//! Everything here serializes into conversation state, so a dialog can
//! suspend at a prompt, survive the process, and resume on the next turn.

use serde::{Deserialize, Serialize};

/// How a suspended prompt interprets the user's next message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    /// Any non-empty text is accepted verbatim.
    Text,
    /// Only one of the listed choices is accepted (case-insensitive).
    Choice { choices: Vec<String> },
    /// An integer is required. `min_exclusive` rejects values at or below
    /// the bound, sending `below_min_message` before the retry text.
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        retry_prompt: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_exclusive: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        below_min_message: Option<String>,
    },
}

/// What recognizing a prompt reply produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Recognition {
    /// The reply was accepted; the dialog resumes with this value.
    Recognized(serde_json::Value),
    /// The reply was not accepted; these messages are re-sent and the
    /// prompt stays suspended.
    Retry(Vec<String>),
}

/// A prompt a dialog suspended on, waiting for the user's next message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingPrompt {
    /// Prompt identifier, for logs.
    pub id: String,
    /// The rendered prompt text, re-sent verbatim on retry.
    pub text: String,
    /// How replies are interpreted.
    pub kind: PromptKind,
}

impl PendingPrompt {
    /// Interpret `input` against this prompt.
    pub fn recognize(&self, input: &str) -> Recognition {
        let trimmed = input.trim();
        match &self.kind {
            PromptKind::Text => {
                if trimmed.is_empty() {
                    Recognition::Retry(vec![self.text.clone()])
                } else {
                    Recognition::Recognized(serde_json::Value::String(trimmed.to_string()))
                }
            }
            PromptKind::Choice { choices } => {
                let lowered = trimmed.to_lowercase();
                match choices.iter().find(|c| **c == lowered) {
                    Some(choice) => {
                        Recognition::Recognized(serde_json::Value::String(choice.clone()))
                    }
                    None => Recognition::Retry(vec![self.text.clone()]),
                }
            }
            PromptKind::Number {
                retry_prompt,
                min_exclusive,
                below_min_message,
            } => {
                let retry = retry_prompt.clone().unwrap_or_else(|| self.text.clone());
                match trimmed.parse::<i64>() {
                    Ok(n) => {
                        if min_exclusive.is_some_and(|min| n <= min) {
                            let mut messages = Vec::new();
                            if let Some(message) = below_min_message {
                                messages.push(message.clone());
                            }
                            messages.push(retry);
                            Recognition::Retry(messages)
                        } else {
                            Recognition::Recognized(serde_json::Value::Number(n.into()))
                        }
                    }
                    Err(_) => Recognition::Retry(vec![retry]),
                }
            }
        }
    }
}

/// Render a choice prompt as `"text (a or b)"`.
pub fn render_choices(text: &str, choices: &[String]) -> String {
    format!("{} ({})", text, choices.join(" or "))
}

/// One waterfall dialog on the stack.
///
/// `step` always points at the next step to run: issuing a prompt advances
/// it past the prompting step, so the recognized reply lands in the step
/// after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogFrame {
    /// Which registered flow this frame runs.
    pub flow_id: String,
    /// Index of the next step to run.
    pub step: usize,
    /// The prompt this frame is suspended on, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awaiting: Option<PendingPrompt>,
}

impl DialogFrame {
    pub fn new(flow_id: impl Into<String>) -> Self {
        Self {
            flow_id: flow_id.into(),
            step: 0,
            awaiting: None,
        }
    }
}

/// The conversation's dialog stack. The top frame owns the turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogStack {
    pub frames: Vec<DialogFrame>,
}

impl DialogStack {
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn top(&self) -> Option<&DialogFrame> {
        self.frames.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut DialogFrame> {
        self.frames.last_mut()
    }

    pub fn push(&mut self, frame: DialogFrame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<DialogFrame> {
        self.frames.pop()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
