use std::time::Duration;

use chrono::Utc;
use sqlx::Row;

use tally_core::collab::{CacheError, SessionCache};

use crate::DbPool;

/// TTL cache backed by the `session_cache` table. Expiry is lazy: stale rows
/// are deleted when a fetch observes them, not by a sweeper.
pub struct SqlSessionCache {
    pool: DbPool,
}

impl SqlSessionCache {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SessionCache for SqlSessionCache {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = Utc::now().timestamp_millis() + ttl.as_millis() as i64;
        sqlx::query(
            "INSERT INTO session_cache (cache_key, value, expires_at)
             VALUES (?, ?, ?)
             ON CONFLICT(cache_key) DO UPDATE SET
                value = excluded.value,
                expires_at = excluded.expires_at",
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|err| CacheError::Backend(err.to_string()))?;

        Ok(())
    }

    async fn fetch(&self, key: &str) -> Result<Option<String>, CacheError> {
        let row = sqlx::query("SELECT value, expires_at FROM session_cache WHERE cache_key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| CacheError::Backend(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        if row.get::<i64, _>("expires_at") <= Utc::now().timestamp_millis() {
            sqlx::query("DELETE FROM session_cache WHERE cache_key = ?")
                .bind(key)
                .execute(&self.pool)
                .await
                .map_err(|err| CacheError::Backend(err.to_string()))?;
            return Ok(None);
        }

        Ok(Some(row.get("value")))
    }
}
