//! Profile capture dialogs.
//!
//! `who_are_you` collects a name and an optional age, then `hello_user`
//! plays the captured profile back. The summary carries the end-of-session
//! marker in its value so the transcript layer can close the session out.

use async_trait::async_trait;
use serde_json::json;

use crate::activity::END_OF_INPUT;
use crate::dialog::context::{Flow, NumberPromptOptions, StepAction, StepContext};
use crate::error::DialogError;

pub const WHO_ARE_YOU: &str = "who_are_you";
pub const HELLO_USER: &str = "hello_user";

const NAME_PROMPT: &str = "name_prompt";
const CONFIRM_AGE_PROMPT: &str = "confirm_age_prompt";
const AGE_PROMPT: &str = "age_prompt";

const YES: &str = "yes";
const NO: &str = "no";

const ASK_NAME: &str = "What is your name, human?";
const ASK_WANT_AGE: &str = "Do you want to give your age?";
const ASK_AGE: &str = "What is your age?";
const AGE_RETRY: &str = "Sorry, please specify your age as a positive number or say cancel.";
const AGE_TOO_LOW: &str = "Your age can't be less than or equal to zero.";
const NO_AGE: &str = "No age given.";

// Sentinel a skipped age step forwards in place of a real answer.
const AGE_SKIPPED: i64 = -1;

/// Four-step interview: name, whether to share an age, the age itself,
/// and an acknowledgement.
pub struct ProfileFlow;

impl ProfileFlow {
    async fn ask_name(&self, step: &mut StepContext<'_>) -> Result<StepAction, DialogError> {
        step.prompt_text(NAME_PROMPT, ASK_NAME).await
    }

    // Stores the name and asks whether the user wants to share an age.
    async fn confirm_age(&self, step: &mut StepContext<'_>) -> Result<StepAction, DialogError> {
        let name = step.result_str().unwrap_or_default().to_string();
        step.profile().name = Some(name);
        step.prompt_choice(CONFIRM_AGE_PROMPT, ASK_WANT_AGE, &[YES, NO]).await
    }

    // Prompts for the age, or skips ahead with the sentinel.
    async fn ask_age(&self, step: &mut StepContext<'_>) -> Result<StepAction, DialogError> {
        match step.result_str() {
            Some(YES) => {
                step.prompt_number(
                    AGE_PROMPT,
                    ASK_AGE,
                    NumberPromptOptions {
                        retry_prompt: Some(AGE_RETRY.to_string()),
                        min_exclusive: Some(0),
                        below_min_message: Some(AGE_TOO_LOW.to_string()),
                    },
                )
                .await
            }
            _ => Ok(StepAction::Next(json!(AGE_SKIPPED))),
        }
    }

    // Stores the age, or acknowledges that none was given.
    async fn capture_age(&self, step: &mut StepContext<'_>) -> Result<StepAction, DialogError> {
        match step.result_i64() {
            Some(age) if age != AGE_SKIPPED => {
                step.profile().age = Some(age);
                step.send_text(format!("I will remember that you are {age} years old."))
                    .await?;
            }
            _ => step.send_text(NO_AGE).await?,
        }
        Ok(StepAction::End(None))
    }
}

#[async_trait]
impl Flow for ProfileFlow {
    fn id(&self) -> &'static str {
        WHO_ARE_YOU
    }

    fn step_count(&self) -> usize {
        4
    }

    async fn run_step(
        &self,
        index: usize,
        step: &mut StepContext<'_>,
    ) -> Result<StepAction, DialogError> {
        match index {
            0 => self.ask_name(step).await,
            1 => self.confirm_age(step).await,
            2 => self.ask_age(step).await,
            3 => self.capture_age(step).await,
            _ => Ok(StepAction::End(None)),
        }
    }
}

/// One-step read-back of the stored profile. Marks the session as done.
pub struct ProfileSummaryFlow;

#[async_trait]
impl Flow for ProfileSummaryFlow {
    fn id(&self) -> &'static str {
        HELLO_USER
    }

    fn step_count(&self) -> usize {
        1
    }

    async fn run_step(
        &self,
        _index: usize,
        step: &mut StepContext<'_>,
    ) -> Result<StepAction, DialogError> {
        let name = step.profile().name.clone().unwrap_or_default();
        let text = match step.profile().age {
            Some(age) => format!("Your name is {name} and you are {age} years old."),
            None => format!("Your name is {name} and you did not share your age."),
        };
        let summary = step.reply(text).with_value(json!(END_OF_INPUT));
        step.send(summary).await?;
        Ok(StepAction::End(None))
    }
}
