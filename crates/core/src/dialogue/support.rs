//! In-crate test doubles for the collaborator seams. The shipping
//! implementations live in `tally-db`; these stay local so the engine tests
//! have no persistence dependency.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::auth;
use crate::collab::{
    AccountDirectory, CacheError, DirectoryError, ExpenseLedger, LedgerError, SessionCache,
};
use crate::dialogue::engine::Collaborators;
use crate::dialogue::responses::test_catalog;
use crate::domain::account::{Account, AccountId, ChatId, NewAccount};
use crate::domain::expense::NewExpense;

#[derive(Default)]
pub(crate) struct MemoryCache {
    entries: RwLock<HashMap<String, (String, Instant)>>,
}

#[async_trait]
impl SessionCache for MemoryCache {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn fetch(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .map(|(value, _)| value.clone()))
    }
}

#[derive(Default)]
pub(crate) struct MemoryDirectory {
    accounts: RwLock<HashMap<i64, Account>>,
}

#[async_trait]
impl AccountDirectory for MemoryDirectory {
    async fn find_by_chat_id(&self, chat_id: ChatId) -> Result<Option<Account>, DirectoryError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(&chat_id.0).cloned())
    }

    async fn create(&self, account: NewAccount) -> Result<Account, DirectoryError> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&account.chat_id.0) {
            return Err(DirectoryError::Duplicate(account.chat_id));
        }
        let created = Account {
            id: AccountId(accounts.len() as i64 + 1),
            chat_id: account.chat_id,
            password_hash: account.credential.password_hash,
            public_key: account.credential.public_key,
            created_at: Utc::now(),
        };
        accounts.insert(account.chat_id.0, created.clone());
        Ok(created)
    }
}

#[derive(Default)]
pub(crate) struct MemoryLedger {
    entries: RwLock<Vec<NewExpense>>,
}

impl MemoryLedger {
    pub(crate) async fn entries(&self) -> Vec<NewExpense> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl ExpenseLedger for MemoryLedger {
    async fn record(&self, expense: NewExpense) -> Result<(), LedgerError> {
        self.entries.write().await.push(expense);
        Ok(())
    }

    async fn total_since(
        &self,
        owner: AccountId,
        since: DateTime<Utc>,
    ) -> Result<Decimal, LedgerError> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|expense| expense.owner == owner && expense.date >= since)
            .map(|expense| expense.total)
            .sum())
    }
}

pub(crate) fn collaborators() -> Collaborators {
    Collaborators {
        cache: Arc::new(MemoryCache::default()),
        users: Arc::new(MemoryDirectory::default()),
        ledger: Arc::new(MemoryLedger::default()),
        catalog: test_catalog(),
    }
}

/// Collaborators plus an account registered with the password
/// `"my-password"`.
pub(crate) async fn collaborators_with_account(
    chat_id: ChatId,
) -> (Collaborators, Arc<MemoryLedger>, Account) {
    let ledger = Arc::new(MemoryLedger::default());
    let deps = Collaborators {
        cache: Arc::new(MemoryCache::default()),
        users: Arc::new(MemoryDirectory::default()),
        ledger: Arc::clone(&ledger) as Arc<dyn ExpenseLedger>,
        catalog: test_catalog(),
    };
    let account = deps
        .users
        .create(NewAccount { chat_id, credential: auth::derive_credential("my-password") })
        .await
        .expect("test account");
    (deps, ledger, account)
}

pub(crate) fn account_fixture(chat_id: ChatId) -> Account {
    let credential = auth::derive_credential("my-password");
    Account {
        id: AccountId(1),
        chat_id,
        password_hash: credential.password_hash,
        public_key: credential.public_key,
        created_at: Utc::now(),
    }
}

pub(crate) fn extraction(raw: &str) -> crate::extraction::EntityExtraction {
    serde_json::from_str(raw).expect("wire JSON should decode")
}
