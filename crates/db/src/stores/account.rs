use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use tally_core::collab::{AccountDirectory, DirectoryError};
use tally_core::domain::account::{Account, AccountId, ChatId, NewAccount};

use crate::DbPool;

pub struct SqlAccountDirectory {
    pool: DbPool,
}

impl SqlAccountDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AccountDirectory for SqlAccountDirectory {
    async fn find_by_chat_id(&self, chat_id: ChatId) -> Result<Option<Account>, DirectoryError> {
        let row = sqlx::query(
            "SELECT id, chat_id, password_hash, public_key, created_at
             FROM accounts
             WHERE chat_id = ?",
        )
        .bind(chat_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| DirectoryError::Backend(err.to_string()))?;

        row.map(account_from_row).transpose()
    }

    async fn create(&self, account: NewAccount) -> Result<Account, DirectoryError> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO accounts (chat_id, password_hash, public_key, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(account.chat_id.0)
        .bind(&account.credential.password_hash)
        .bind(&account.credential.public_key)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DirectoryError::Duplicate(account.chat_id)
            }
            _ => DirectoryError::Backend(err.to_string()),
        })?;

        Ok(Account {
            id: AccountId(result.last_insert_rowid()),
            chat_id: account.chat_id,
            password_hash: account.credential.password_hash,
            public_key: account.credential.public_key,
            created_at,
        })
    }
}

fn account_from_row(row: SqliteRow) -> Result<Account, DirectoryError> {
    let created_at_raw: String = row.get("created_at");
    let created_at = DateTime::parse_from_rfc3339(&created_at_raw)
        .map_err(|err| DirectoryError::Backend(format!("bad created_at `{created_at_raw}`: {err}")))?
        .with_timezone(&Utc);

    Ok(Account {
        id: AccountId(row.get("id")),
        chat_id: ChatId(row.get("chat_id")),
        password_hash: row.get("password_hash"),
        public_key: row.get("public_key"),
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use tally_core::auth;
    use tally_core::collab::{AccountDirectory, DirectoryError};
    use tally_core::domain::account::{ChatId, NewAccount};

    use super::SqlAccountDirectory;
    use crate::migrations::run_pending;
    use crate::connect_with_settings;

    async fn directory() -> SqlAccountDirectory {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");
        SqlAccountDirectory::new(pool)
    }

    #[tokio::test]
    async fn created_account_round_trips_through_lookup() {
        let directory = directory().await;
        let created = directory
            .create(NewAccount {
                chat_id: ChatId(42),
                credential: auth::derive_credential("my-password"),
            })
            .await
            .expect("create account");

        let found = directory
            .find_by_chat_id(ChatId(42))
            .await
            .expect("lookup")
            .expect("account should exist");
        assert_eq!(found, created);
        assert!(auth::verify_password("my-password", &found.password_hash));
    }

    #[tokio::test]
    async fn unknown_chat_id_finds_nothing() {
        let directory = directory().await;
        let found = directory.find_by_chat_id(ChatId(999)).await.expect("lookup");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn duplicate_chat_id_is_rejected() {
        let directory = directory().await;
        directory
            .create(NewAccount {
                chat_id: ChatId(42),
                credential: auth::derive_credential("first"),
            })
            .await
            .expect("create account");

        let error = directory
            .create(NewAccount {
                chat_id: ChatId(42),
                credential: auth::derive_credential("second"),
            })
            .await
            .expect_err("second create should fail");
        assert!(matches!(error, DirectoryError::Duplicate(ChatId(42))));
    }
}
