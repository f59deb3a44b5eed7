//! Turn driver: load-or-create a conversation for the sender, run steps
//! until something worth saying comes out, write the state back.
//!
//! Turns for different users are independent; turns for one user race
//! last-write-wins under the store TTL (no distributed lock, accepted gap).

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::collab::{AccountDirectory, CacheError, ExpenseLedger, SessionCache};
use crate::dialogue::conversation::Conversation;
use crate::dialogue::responses::{BotResponse, MessageKey, ResponseCatalog};
use crate::domain::account::ChatId;
use crate::extraction::EntityExtraction;

/// Lifetime of a persisted conversation: one multi-turn exchange, not
/// long-term storage. Doubles as the abandon-a-stalled-conversation timeout.
pub const CONVERSATION_TTL: Duration = Duration::from_secs(60);

/// Lifetime of a cached validated password.
pub const PASSWORD_TTL: Duration = Duration::from_secs(180);

pub fn conversation_key(chat_id: ChatId) -> String {
    format!("{chat_id}_conversation")
}

pub fn password_key(chat_id: ChatId) -> String {
    format!("{chat_id}_password")
}

/// The narrow collaborator set the engine and its step functions run
/// against. The catalog rides along so responses stay injectable.
#[derive(Clone)]
pub struct Collaborators {
    pub cache: Arc<dyn SessionCache>,
    pub users: Arc<dyn AccountDirectory>,
    pub ledger: Arc<dyn ExpenseLedger>,
    pub catalog: ResponseCatalog,
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("no conversation found")]
    NotFound,
    #[error("no responses available")]
    NoResponses,
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Reads the sender's conversation from the store. Distinguishes "nothing
/// cached" from "cached but terminated"; an undecodable entry is treated as
/// absent so a stale payload cannot wedge the sender.
pub async fn load_conversation(
    chat_id: ChatId,
    cache: &dyn SessionCache,
) -> Result<Conversation, LookupError> {
    let raw = cache.fetch(&conversation_key(chat_id)).await?.ok_or(LookupError::NotFound)?;
    let conversation: Conversation = match serde_json::from_str(&raw) {
        Ok(conversation) => conversation,
        Err(error) => {
            warn!(chat_id = %chat_id, error = %error, "discarding undecodable conversation entry");
            return Err(LookupError::NotFound);
        }
    };
    if !conversation.has_response() {
        return Err(LookupError::NoResponses);
    }
    Ok(conversation)
}

pub async fn save_conversation(
    conversation: &Conversation,
    cache: &dyn SessionCache,
) -> Result<(), CacheError> {
    let raw = serde_json::to_string(conversation)
        .map_err(|error| CacheError::Backend(error.to_string()))?;
    cache.put(&conversation_key(conversation.chat_id), &raw, CONVERSATION_TTL).await
}

/// The dialogue engine: one `converse` call processes one inbound message.
pub struct Dialogue {
    deps: Collaborators,
}

impl Dialogue {
    pub fn new(deps: Collaborators) -> Self {
        Self { deps }
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.deps
    }

    /// Runs one dialogue turn. Never fails outward: collaborator errors are
    /// mapped to the generic failure response so the transport layer always
    /// has something well-formed to deliver (possibly the empty response on
    /// a classification miss).
    pub async fn converse(
        &self,
        chat_id: ChatId,
        text: &str,
        extraction: EntityExtraction,
    ) -> BotResponse {
        let mut conversation = match load_conversation(chat_id, self.deps.cache.as_ref()).await {
            Ok(conversation) => conversation,
            Err(LookupError::NotFound) | Err(LookupError::NoResponses) => {
                let account = match self.deps.users.find_by_chat_id(chat_id).await {
                    Ok(account) => account,
                    Err(error) => {
                        warn!(chat_id = %chat_id, error = %error, "account lookup failed");
                        return self.deps.catalog.get(MessageKey::Error, "");
                    }
                };
                match Conversation::begin(chat_id, account.as_ref(), &extraction) {
                    Some(conversation) => conversation,
                    // Could not classify: stay silent rather than guessing.
                    None => return BotResponse::default(),
                }
            }
            Err(LookupError::Cache(error)) => {
                warn!(chat_id = %chat_id, error = %error, "conversation store read failed");
                return self.deps.catalog.get(MessageKey::Error, "");
            }
        };

        conversation.set_last_message(extraction, text);

        let mut reply = conversation.respond(&self.deps).await;
        // Silent steps (e.g. a cached password gate) chain within the turn.
        while reply.is_empty() && conversation.has_response() {
            reply = conversation.respond(&self.deps).await;
        }

        if conversation.has_response() {
            if let Err(error) = save_conversation(&conversation, self.deps.cache.as_ref()).await {
                warn!(chat_id = %chat_id, error = %error, "conversation store write failed");
            }
        }

        reply
    }
}
