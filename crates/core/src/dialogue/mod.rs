//! The dialogue/intent engine: conversation state machine, intent
//! classification, per-intent step handlers, and the response catalog.

pub mod conversation;
pub mod engine;
pub mod intent;
pub mod responses;

mod expense_total;
mod onboard;
mod track_expense;

#[cfg(test)]
pub(crate) mod support;

pub use conversation::{Conversation, MessageContext, StepOutcome, TERMINATED_STEP};
pub use engine::{
    conversation_key, load_conversation, password_key, save_conversation, Collaborators, Dialogue,
    LookupError, CONVERSATION_TTL, PASSWORD_TTL,
};
pub use intent::Intent;
pub use responses::{BotResponse, MessageKey, ResponseCatalog};
