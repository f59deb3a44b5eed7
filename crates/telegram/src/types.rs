//! Inbound webhook payloads, mirroring the Bot API `Update` object. Only the
//! fields the bot reads are modeled; the rest of the payload is ignored on
//! decode.

use serde::Deserialize;

use tally_core::domain::account::ChatId;

#[derive(Clone, Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Update {
    /// The chat and text of a plain user message, if that is what this
    /// update carries. Bot-authored and non-text updates yield `None`.
    pub fn user_text(&self) -> Option<(ChatId, &str)> {
        let message = self.message.as_ref()?;
        if message.from.as_ref().is_some_and(|user| user.is_bot) {
            return None;
        }
        let text = message.text.as_deref()?;
        Some((ChatId(message.chat.id), text))
    }
}
