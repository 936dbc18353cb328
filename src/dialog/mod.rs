//! Waterfall dialog engine.
//!
//! Flows are fixed sequences of async steps registered in a [`DialogSet`].
//! A step either completes with a [`StepAction`] that moves the stack, or
//! suspends on a prompt; the per-conversation [`DialogStack`] records where
//! to resume when the next activity arrives.

pub mod context;
pub mod flows;
pub mod state;

pub use context::{DialogContext, DialogSet, Flow, NumberPromptOptions, StepAction, StepContext};
pub use state::{DialogFrame, DialogStack, PendingPrompt, PromptKind, Recognition};
