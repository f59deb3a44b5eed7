//! TrackExpense: a single "fire and confirm" step. The ledger write is
//! submitted as a detached task; the user-facing confirmation does not wait
//! on it, and a failed write is logged rather than retried (best-effort,
//! at-most-once).

use std::sync::Arc;

use tracing::warn;

use crate::collab::{AccountDirectory, ExpenseLedger};
use crate::dialogue::conversation::{Conversation, StepOutcome};
use crate::dialogue::engine::Collaborators;
use crate::dialogue::responses::MessageKey;
use crate::domain::account::Account;
use crate::domain::expense::NewExpense;
use crate::errors::DialogueError;
use crate::extraction::{EntityExtraction, MessageOverview};

pub(super) const STEP_COUNT: usize = 1;

pub(super) struct TrackExpense<'a> {
    pub convo: &'a mut Conversation,
    pub deps: &'a Collaborators,
}

impl TrackExpense<'_> {
    pub async fn run(&mut self, _step: usize) -> Result<StepOutcome, DialogueError> {
        self.confirm_expense().await
    }

    async fn confirm_expense(&mut self) -> Result<StepOutcome, DialogueError> {
        let account = self
            .deps
            .users
            .find_by_chat_id(self.convo.chat_id)
            .await?
            .ok_or(DialogueError::MissingState("registered account"))?;

        let extraction = &self.convo.context.extraction;
        if extraction.overview() != MessageOverview::TrackingRequested {
            return Ok(StepOutcome::End(self.deps.catalog.get(MessageKey::TrackExpenseError, "")));
        }

        let expense = build_expense(extraction, &account)?;
        let ledger = Arc::clone(&self.deps.ledger);
        let chat_id = self.convo.chat_id;
        tokio::spawn(async move {
            if let Err(error) = ledger.record(expense).await {
                warn!(chat_id = %chat_id, error = %error, "expense write failed");
            }
        });

        Ok(StepOutcome::End(self.deps.catalog.get(MessageKey::TrackExpenseSuccess, "")))
    }
}

fn build_expense(
    extraction: &EntityExtraction,
    account: &Account,
) -> Result<NewExpense, DialogueError> {
    let (total, currency) =
        extraction.amount().map_err(|_| DialogueError::MissingState("expense amount"))?;
    let description =
        extraction.description().map_err(|_| DialogueError::MissingState("expense description"))?;

    Ok(NewExpense {
        owner: account.id,
        description,
        total,
        currency,
        date: extraction.date(),
        public_key: account.public_key.clone(),
    })
}
