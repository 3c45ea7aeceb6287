//! Session store - bearer tokens for the access gateway

use crate::db::{format_timestamp, parse_timestamp, Db};
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use minibank_core::AccountId;
use sqlx::Row;

/// An active login session.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: i64,
    pub account_id: AccountId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionStore {
    db: Db,
}

impl SessionStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn insert(
        &self,
        account_id: AccountId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO sessions (account_id, token, expires_at, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(account_id.get())
        .bind(token)
        .bind(format_timestamp(expires_at))
        .bind(format_timestamp(Utc::now()))
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    /// Look up a token, returning only sessions that have not expired.
    pub async fn find_valid(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError> {
        let row = sqlx::query(
            "SELECT id, account_id, token, expires_at, created_at FROM sessions WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(self.db.pool())
        .await?;

        let Some(row) = row else { return Ok(None) };
        let expires_raw: String = row.try_get("expires_at")?;
        let created_raw: String = row.try_get("created_at")?;
        let session = Session {
            id: row.try_get("id")?,
            account_id: AccountId(row.try_get("account_id")?),
            token: row.try_get("token")?,
            expires_at: parse_timestamp("expires_at", &expires_raw)?,
            created_at: parse_timestamp("created_at", &created_raw)?,
        };

        if session.expires_at <= now {
            return Ok(None);
        }
        Ok(Some(session))
    }

    pub async fn delete(&self, token: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    /// Drop every session for an account (used after password changes).
    pub async fn delete_all_for(&self, account_id: AccountId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE account_id = ?")
            .bind(account_id.get())
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(format_timestamp(now))
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected())
    }
}
