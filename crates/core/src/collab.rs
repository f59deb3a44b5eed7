//! Collaborator contracts consumed by the dialogue engine.
//!
//! The engine only ever talks to these narrow seams; sqlite and in-memory
//! implementations live in `tally-db`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::account::{Account, AccountId, ChatId, NewAccount};
use crate::domain::expense::NewExpense;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend failure: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("account already exists for chat {0}")]
    Duplicate(ChatId),
    #[error("account storage failure: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger storage failure: {0}")]
    Backend(String),
}

/// Short-lived keyed cache with per-entry TTL. Backs both the serialized
/// conversation store and the validated-password cache. Last write wins;
/// there is no compare-and-set.
#[async_trait]
pub trait SessionCache: Send + Sync {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Returns `None` for keys that were never written or whose TTL has
    /// elapsed.
    async fn fetch(&self, key: &str) -> Result<Option<String>, CacheError>;
}

/// Registered-user lookup and creation, keyed by external chat identity.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn find_by_chat_id(&self, chat_id: ChatId) -> Result<Option<Account>, DirectoryError>;

    async fn create(&self, account: NewAccount) -> Result<Account, DirectoryError>;
}

/// Expense persistence and aggregation.
#[async_trait]
pub trait ExpenseLedger: Send + Sync {
    async fn record(&self, expense: NewExpense) -> Result<(), LedgerError>;

    /// Total spend for `owner` on records dated at or after `since`.
    async fn total_since(
        &self,
        owner: AccountId,
        since: DateTime<Utc>,
    ) -> Result<Decimal, LedgerError>;
}
