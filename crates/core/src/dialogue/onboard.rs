//! Onboarding: asks a new sender for a password, confirms it, then creates
//! their account with a derived credential.

use crate::auth;
use crate::collab::AccountDirectory;
use crate::dialogue::conversation::{parse_affirmation, Conversation, StepOutcome};
use crate::dialogue::engine::Collaborators;
use crate::dialogue::responses::MessageKey;
use crate::domain::account::NewAccount;
use crate::errors::DialogueError;

pub(super) const STEP_COUNT: usize = 3;

pub(super) struct Onboarding<'a> {
    pub convo: &'a mut Conversation,
    pub deps: &'a Collaborators,
}

impl Onboarding<'_> {
    pub async fn run(&mut self, step: usize) -> Result<StepOutcome, DialogueError> {
        match step {
            0 => Ok(self.ask_for_password()),
            1 => Ok(self.confirm_password()),
            _ => self.validate_password().await,
        }
    }

    fn ask_for_password(&self) -> StepOutcome {
        StepOutcome::Advance(self.deps.catalog.get(MessageKey::OnboardAskPassword, ""))
    }

    /// Holds the proposed password in `aux` and echoes it back for a yes/no
    /// confirmation.
    fn confirm_password(&mut self) -> StepOutcome {
        let password = self.convo.context.text.trim().to_string();
        if password.is_empty() {
            return StepOutcome::Retry(self.deps.catalog.get(MessageKey::NotUnderstood, ""));
        }
        let response = self.deps.catalog.get(MessageKey::OnboardConfirmPassword, &password);
        self.convo.aux = Some(password);
        StepOutcome::Advance(response)
    }

    async fn validate_password(&mut self) -> Result<StepOutcome, DialogueError> {
        match parse_affirmation(&self.convo.context.text) {
            Some(true) => {
                let password = self
                    .convo
                    .aux
                    .clone()
                    .ok_or(DialogueError::MissingState("proposed password"))?;
                let account = self
                    .deps
                    .users
                    .create(NewAccount {
                        chat_id: self.convo.chat_id,
                        credential: auth::derive_credential(&password),
                    })
                    .await?;
                self.convo.account_id = Some(account.id);
                Ok(StepOutcome::End(self.deps.catalog.get(MessageKey::OnboardSuccess, "")))
            }
            Some(false) => Ok(StepOutcome::End(self.deps.catalog.get(MessageKey::OnboardDecline, ""))),
            None => Ok(StepOutcome::Retry(self.deps.catalog.get(MessageKey::NotUnderstood, ""))),
        }
    }
}
