//! ExpenseTotalQuery: the password-gated aggregate query.
//!
//! Password handling is split across two steps so that a cached validated
//! password lets both answer silently (empty response) and the turn driver
//! falls through to the report without special-casing the caller.

use tracing::warn;

use crate::auth;
use crate::collab::{AccountDirectory, ExpenseLedger, SessionCache};
use crate::dialogue::conversation::{Conversation, StepOutcome};
use crate::dialogue::engine::{password_key, Collaborators, PASSWORD_TTL};
use crate::dialogue::responses::{BotResponse, MessageKey};
use crate::domain::expense::SpendPeriod;
use crate::errors::DialogueError;

pub(super) const STEP_COUNT: usize = 3;

pub(super) struct ExpenseTotal<'a> {
    pub convo: &'a mut Conversation,
    pub deps: &'a Collaborators,
}

impl ExpenseTotal<'_> {
    pub async fn run(&mut self, step: usize) -> Result<StepOutcome, DialogueError> {
        match step {
            0 => self.ask_for_password().await,
            1 => self.validate_password().await,
            _ => self.report_total().await,
        }
    }

    /// Captures the period phrase for the report step, then prompts for a
    /// password unless a validated one is still cached for this sender.
    async fn ask_for_password(&mut self) -> Result<StepOutcome, DialogueError> {
        if let Ok(period) = self.convo.context.extraction.spend_period() {
            self.convo.aux = Some(period);
        }

        let cached = self.deps.cache.fetch(&password_key(self.convo.chat_id)).await?;
        if cached.is_some() {
            return Ok(StepOutcome::Advance(BotResponse::default()));
        }
        Ok(StepOutcome::Advance(self.deps.catalog.get(MessageKey::TotalAskPassword, "")))
    }

    async fn validate_password(&mut self) -> Result<StepOutcome, DialogueError> {
        let key = password_key(self.convo.chat_id);
        if self.deps.cache.fetch(&key).await?.is_some() {
            return Ok(StepOutcome::Advance(BotResponse::default()));
        }

        let account = self
            .deps
            .users
            .find_by_chat_id(self.convo.chat_id)
            .await?
            .ok_or(DialogueError::MissingState("registered account"))?;

        let password = self.convo.context.text.trim();
        if !auth::verify_password(password, &account.password_hash) {
            warn!(chat_id = %self.convo.chat_id, "password validation failed");
            return Ok(StepOutcome::Reject(
                self.deps.catalog.get(MessageKey::TotalInvalidPassword, ""),
            ));
        }

        self.deps.cache.put(&key, password, PASSWORD_TTL).await?;
        Ok(StepOutcome::Advance(BotResponse::default()))
    }

    async fn report_total(&mut self) -> Result<StepOutcome, DialogueError> {
        let period = match self
            .convo
            .aux
            .as_deref()
            .unwrap_or_default()
            .parse::<SpendPeriod>()
        {
            Ok(period) => period,
            Err(error) => {
                warn!(chat_id = %self.convo.chat_id, error = %error, "cannot report spend total");
                return Ok(StepOutcome::End(self.deps.catalog.get(MessageKey::Error, "")));
            }
        };

        let owner = match self.convo.account_id {
            Some(id) => id,
            None => {
                self.deps
                    .users
                    .find_by_chat_id(self.convo.chat_id)
                    .await?
                    .ok_or(DialogueError::MissingState("registered account"))?
                    .id
            }
        };

        let total = self.deps.ledger.total_since(owner, period.start(chrono::Utc::now())).await?;
        Ok(StepOutcome::End(self.deps.catalog.get(MessageKey::TotalSpent, &format!("{total:.2}"))))
    }
}
