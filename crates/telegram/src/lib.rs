//! Telegram Bot API integration: webhook update types and the outbound
//! client used to answer chats.

pub mod client;
pub mod types;

pub use client::{TelegramClient, TelegramError};
pub use types::{Chat, Message, Update, User};
