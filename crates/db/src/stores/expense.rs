use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{sqlite::SqliteRow, Row};

use tally_core::collab::{ExpenseLedger, LedgerError};
use tally_core::domain::account::AccountId;
use tally_core::domain::expense::{Expense, NewExpense};

use crate::DbPool;

/// Ledger backed by the `expenses` table. Totals are stored as decimal
/// strings and summed in Rust so no precision is lost to float columns.
pub struct SqlExpenseLedger {
    pool: DbPool,
}

impl SqlExpenseLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_owner(&self, owner: AccountId) -> Result<Vec<Expense>, LedgerError> {
        let rows = sqlx::query(
            "SELECT id, owner_id, description, total, currency, date, public_key
             FROM expenses
             WHERE owner_id = ?
             ORDER BY datetime(date) ASC",
        )
        .bind(owner.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| LedgerError::Backend(err.to_string()))?;

        rows.into_iter().map(expense_from_row).collect()
    }
}

#[async_trait::async_trait]
impl ExpenseLedger for SqlExpenseLedger {
    async fn record(&self, expense: NewExpense) -> Result<(), LedgerError> {
        sqlx::query(
            "INSERT INTO expenses (owner_id, description, total, currency, date, public_key, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(expense.owner.0)
        .bind(&expense.description)
        .bind(expense.total.to_string())
        .bind(&expense.currency)
        .bind(expense.date.to_rfc3339())
        .bind(&expense.public_key)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|err| LedgerError::Backend(err.to_string()))?;

        Ok(())
    }

    async fn total_since(
        &self,
        owner: AccountId,
        since: DateTime<Utc>,
    ) -> Result<Decimal, LedgerError> {
        let rows = sqlx::query(
            "SELECT total FROM expenses WHERE owner_id = ? AND datetime(date) >= datetime(?)",
        )
        .bind(owner.0)
        .bind(since.to_rfc3339())
        .fetch_all(&self.pool)
        .await
        .map_err(|err| LedgerError::Backend(err.to_string()))?;

        let mut total = Decimal::ZERO;
        for row in rows {
            total += parse_total(&row.get::<String, _>("total"))?;
        }
        Ok(total)
    }
}

fn parse_total(raw: &str) -> Result<Decimal, LedgerError> {
    raw.parse::<Decimal>().map_err(|err| LedgerError::Backend(format!("bad total `{raw}`: {err}")))
}

fn expense_from_row(row: SqliteRow) -> Result<Expense, LedgerError> {
    let date_raw: String = row.get("date");
    let date = DateTime::parse_from_rfc3339(&date_raw)
        .map_err(|err| LedgerError::Backend(format!("bad date `{date_raw}`: {err}")))?
        .with_timezone(&Utc);

    Ok(Expense {
        id: row.get("id"),
        owner: AccountId(row.get("owner_id")),
        description: row.get("description"),
        total: parse_total(&row.get::<String, _>("total"))?,
        currency: row.get("currency"),
        date,
        public_key: row.get("public_key"),
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    use tally_core::auth;
    use tally_core::collab::{AccountDirectory, ExpenseLedger};
    use tally_core::domain::account::{Account, ChatId, NewAccount};
    use tally_core::domain::expense::NewExpense;

    use super::SqlExpenseLedger;
    use crate::migrations::run_pending;
    use crate::stores::SqlAccountDirectory;
    use crate::connect_with_settings;

    async fn ledger_with_account() -> (SqlExpenseLedger, Account) {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");
        let account = SqlAccountDirectory::new(pool.clone())
            .create(NewAccount {
                chat_id: ChatId(42),
                credential: auth::derive_credential("my-password"),
            })
            .await
            .expect("create account");
        (SqlExpenseLedger::new(pool), account)
    }

    fn expense(account: &Account, total: Decimal, days_ago: i64) -> NewExpense {
        NewExpense {
            owner: account.id,
            description: "Coffee".to_string(),
            total,
            currency: "EUR".to_string(),
            date: Utc::now() - Duration::days(days_ago),
            public_key: account.public_key.clone(),
        }
    }

    #[tokio::test]
    async fn recorded_expenses_round_trip() {
        let (ledger, account) = ledger_with_account().await;
        ledger.record(expense(&account, Decimal::new(1250, 2), 0)).await.expect("record");

        let entries = ledger.list_for_owner(account.id).await.expect("list");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].total, Decimal::new(1250, 2));
        assert_eq!(entries[0].currency, "EUR");
        assert_eq!(entries[0].description, "Coffee");
        assert_eq!(entries[0].public_key, account.public_key);
    }

    #[tokio::test]
    async fn total_since_sums_only_records_in_the_window() {
        let (ledger, account) = ledger_with_account().await;
        ledger.record(expense(&account, Decimal::new(1000, 2), 0)).await.expect("record");
        ledger.record(expense(&account, Decimal::new(250, 2), 2)).await.expect("record");
        ledger.record(expense(&account, Decimal::new(9999, 2), 30)).await.expect("record");

        let total =
            ledger.total_since(account.id, Utc::now() - Duration::days(7)).await.expect("total");
        assert_eq!(total, Decimal::new(1250, 2));
    }

    #[tokio::test]
    async fn total_since_is_zero_for_an_empty_ledger() {
        let (ledger, account) = ledger_with_account().await;
        let total =
            ledger.total_since(account.id, Utc::now() - Duration::days(7)).await.expect("total");
        assert_eq!(total, Decimal::ZERO);
    }
}
