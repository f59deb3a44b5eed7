use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use tally_core::collab::{
    AccountDirectory, CacheError, DirectoryError, ExpenseLedger, LedgerError, SessionCache,
};
use tally_core::domain::account::{Account, AccountId, ChatId, NewAccount};
use tally_core::domain::expense::NewExpense;

#[derive(Default)]
pub struct InMemorySessionCache {
    entries: RwLock<HashMap<String, (String, Instant)>>,
}

impl InMemorySessionCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SessionCache for InMemorySessionCache {
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
pub struct InMemoryAccountDirectory {
    accounts: RwLock<Vec<Account>>,
}

impl InMemoryAccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl AccountDirectory for InMemoryAccountDirectory {
    async fn find_by_chat_id(&self, chat_id: ChatId) -> Result<Option<Account>, DirectoryError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.iter().find(|account| account.chat_id == chat_id).cloned())
    }

    async fn create(&self, account: NewAccount) -> Result<Account, DirectoryError> {
        let mut accounts = self.accounts.write().await;
        if accounts.iter().any(|existing| existing.chat_id == account.chat_id) {
            return Err(DirectoryError::Duplicate(account.chat_id));
        }
        let created = Account {
            id: AccountId(accounts.len() as i64 + 1),
            chat_id: account.chat_id,
            password_hash: account.credential.password_hash,
            public_key: account.credential.public_key,
            created_at: Utc::now(),
        };
        accounts.push(created.clone());
        Ok(created)
    }
}

#[derive(Default)]
pub struct InMemoryExpenseLedger {
    entries: RwLock<Vec<NewExpense>>,
}

impl InMemoryExpenseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<NewExpense> {
        self.entries.read().await.clone()
    }
}

#[async_trait::async_trait]
impl ExpenseLedger for InMemoryExpenseLedger {
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

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{Duration as ChronoDuration, Utc};
    use rust_decimal::Decimal;

    use tally_core::auth;
    use tally_core::collab::{
        AccountDirectory, DirectoryError, ExpenseLedger, SessionCache,
    };
    use tally_core::domain::account::ChatId;
    use tally_core::domain::expense::NewExpense;

    use super::{InMemoryAccountDirectory, InMemoryExpenseLedger, InMemorySessionCache};
    use tally_core::domain::account::NewAccount;

    #[tokio::test]
    async fn cache_honors_ttl() {
        let cache = InMemorySessionCache::new();
        cache.put("k", "v", Duration::from_millis(10)).await.expect("put");
        assert_eq!(cache.fetch("k").await.expect("fetch").as_deref(), Some("v"));

        tokio::time::sleep(Duration::from_millis(25)).await;
        assert!(cache.fetch("k").await.expect("fetch").is_none());
    }

    #[tokio::test]
    async fn directory_rejects_duplicate_chat_ids() {
        let directory = InMemoryAccountDirectory::new();
        directory
            .create(NewAccount { chat_id: ChatId(1), credential: auth::derive_credential("a") })
            .await
            .expect("create");

        let error = directory
            .create(NewAccount { chat_id: ChatId(1), credential: auth::derive_credential("b") })
            .await
            .expect_err("duplicate should fail");
        assert!(matches!(error, DirectoryError::Duplicate(ChatId(1))));
    }

    #[tokio::test]
    async fn ledger_totals_respect_owner_and_window() {
        let directory = InMemoryAccountDirectory::new();
        let account = directory
            .create(NewAccount { chat_id: ChatId(1), credential: auth::derive_credential("a") })
            .await
            .expect("create");

        let ledger = InMemoryExpenseLedger::new();
        ledger
            .record(NewExpense {
                owner: account.id,
                description: "Coffee".to_string(),
                total: Decimal::new(500, 2),
                currency: "EUR".to_string(),
                date: Utc::now(),
                public_key: account.public_key.clone(),
            })
            .await
            .expect("record");

        let total = ledger
            .total_since(account.id, Utc::now() - ChronoDuration::days(1))
            .await
            .expect("total");
        assert_eq!(total, Decimal::new(500, 2));
    }
}
