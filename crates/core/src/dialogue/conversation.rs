//! Conversation: the persisted, per-user dialogue state machine.
//!
//! `step` counts through the active intent's ordered step sequence;
//! `TERMINATED_STEP` is the sentinel for "no further responses". One
//! `respond` call executes exactly one step; the turn driver in
//! [`super::engine`] chains silent steps and handles persistence.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dialogue::engine::Collaborators;
use crate::dialogue::intent::Intent;
use crate::dialogue::responses::{BotResponse, MessageKey};
use crate::dialogue::{expense_total, onboard, track_expense};
use crate::domain::account::{Account, AccountId, ChatId};
use crate::errors::DialogueError;
use crate::extraction::EntityExtraction;

/// Sentinel step value of a terminated conversation.
pub const TERMINATED_STEP: i32 = -1;

/// The latest turn's input, recorded before `respond` runs so the current
/// step can inspect what the user just said.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageContext {
    pub extraction: EntityExtraction,
    pub text: String,
}

/// Result of executing one step function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Move on to the next step.
    Advance(BotResponse),
    /// Input was not understood; the same step repeats.
    Retry(BotResponse),
    /// Input failed validation (wrong password); the same step repeats, but
    /// distinctly from `Retry` so callers can observe the signaled failure.
    Reject(BotResponse),
    /// Terminate the conversation.
    End(BotResponse),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub chat_id: ChatId,
    /// Internal account id used when the engine attributes records it
    /// creates; absent until the sender is onboarded.
    pub account_id: Option<AccountId>,
    pub intent: Intent,
    pub step: i32,
    #[serde(default)]
    pub context: MessageContext,
    /// Free-form scratch value a single intent carries between its own
    /// steps (e.g. a resolved spend-period phrase).
    pub aux: Option<String>,
}

impl Conversation {
    pub fn new(chat_id: ChatId, account_id: Option<AccountId>, intent: Intent) -> Self {
        Self {
            chat_id,
            account_id,
            intent,
            step: 0,
            context: MessageContext::default(),
            aux: None,
        }
    }

    /// Starts a conversation for a freshly classified message, or `None`
    /// when no intent could be inferred.
    pub fn begin(
        chat_id: ChatId,
        account: Option<&Account>,
        extraction: &EntityExtraction,
    ) -> Option<Self> {
        let intent = Intent::classify(extraction, account.is_some())?;
        Some(Self::new(chat_id, account.map(|account| account.id), intent))
    }

    /// True iff the conversation can still produce a response.
    pub fn has_response(&self) -> bool {
        self.step >= 0
    }

    pub fn end(&mut self) {
        self.step = TERMINATED_STEP;
    }

    /// Records the latest turn's input. Always allowed, including on a
    /// terminated conversation.
    pub fn set_last_message(&mut self, extraction: EntityExtraction, text: impl Into<String>) {
        self.context = MessageContext { extraction, text: text.into() };
    }

    /// Executes the current step of the active intent and applies its
    /// transition. A terminated conversation answers with an empty response
    /// and stays terminated; a step index past the end of the sequence
    /// yields the outro and terminates instead of indexing out of range.
    pub async fn respond(&mut self, deps: &Collaborators) -> BotResponse {
        if !self.has_response() {
            return BotResponse::default();
        }

        if self.step as usize >= self.intent.step_count() {
            self.end();
            return deps.catalog.get(MessageKey::Outro, "");
        }

        match self.run_step(deps).await {
            Ok(StepOutcome::Advance(response)) => {
                self.step += 1;
                response
            }
            Ok(StepOutcome::Retry(response)) | Ok(StepOutcome::Reject(response)) => response,
            Ok(StepOutcome::End(response)) => {
                self.end();
                response
            }
            Err(error) => {
                warn!(chat_id = %self.chat_id, error = %error, "dialogue step failed");
                self.end();
                deps.catalog.get(MessageKey::Error, "")
            }
        }
    }

    async fn run_step(&mut self, deps: &Collaborators) -> Result<StepOutcome, DialogueError> {
        let step = self.step as usize;
        match self.intent {
            Intent::OnboardUser => onboard::Onboarding { convo: self, deps }.run(step).await,
            Intent::TrackExpense => {
                track_expense::TrackExpense { convo: self, deps }.run(step).await
            }
            Intent::GetExpenseTotal => {
                expense_total::ExpenseTotal { convo: self, deps }.run(step).await
            }
        }
    }
}

/// Interprets a yes/no answer; `None` when the text is neither.
pub(super) fn parse_affirmation(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "yeah" | "yep" | "ok" | "okay" | "correct" | "sure" => Some(true),
        "no" | "n" | "nope" | "nah" => Some(false),
        _ => None,
    }
}
