pub mod auth;
pub mod collab;
pub mod config;
pub mod dialogue;
pub mod domain;
pub mod errors;
pub mod extraction;

pub use collab::{
    AccountDirectory, CacheError, DirectoryError, ExpenseLedger, LedgerError, SessionCache,
};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use dialogue::{
    BotResponse, Collaborators, Conversation, Dialogue, Intent, LookupError, MessageKey,
    ResponseCatalog,
};
pub use domain::account::{Account, AccountId, ChatId, NewAccount};
pub use domain::expense::{Expense, NewExpense, SpendPeriod};
pub use errors::DialogueError;
pub use extraction::{EntityExtraction, ExtractionError, MessageOverview};

pub use chrono;
pub use rust_decimal;
