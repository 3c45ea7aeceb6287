//! Account store - user records and account numbers

use crate::db::{format_timestamp, parse_decimal, parse_timestamp, Db};
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use minibank_core::{AccountId, Amount};
use rand::Rng;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// A persisted user record.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub account_number: String,
    pub balance: Amount,
    pub created_at: DateTime<Utc>,
}

pub(crate) fn account_from_row(row: &SqliteRow) -> Result<Account, StoreError> {
    let balance_raw: String = row.try_get("balance")?;
    let created_raw: String = row.try_get("created_at")?;
    Ok(Account {
        id: AccountId(row.try_get("id")?),
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        account_number: row.try_get("account_number")?,
        balance: Amount::new_unchecked(parse_decimal("balance", &balance_raw)?),
        created_at: parse_timestamp("created_at", &created_raw)?,
    })
}

const SELECT_ACCOUNT: &str =
    "SELECT id, username, email, password_hash, account_number, balance, created_at FROM accounts";

/// Read access to `accounts` plus row creation.
///
/// Balance mutation is deliberately absent: only the ledger engine writes
/// the `balance` column, inside its own transactions.
#[derive(Clone)]
pub struct AccountStore {
    db: Db,
}

impl AccountStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Insert a new account with a fresh unique account number and zero
    /// balance. The onboarding credit is granted by the ledger afterwards.
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Account, StoreError> {
        let account_number = self.generate_account_number().await?;
        let now = format_timestamp(Utc::now());

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO accounts (username, email, password_hash, account_number, balance, created_at)
            VALUES (?, ?, ?, ?, '0', ?)
            RETURNING id
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(&account_number)
        .bind(&now)
        .fetch_one(self.db.pool())
        .await?;

        self.get(AccountId(id))
            .await?
            .ok_or_else(|| StoreError::corrupt("id", id))
    }

    pub async fn get(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_ACCOUNT} WHERE id = ?"))
            .bind(id.get())
            .fetch_optional(self.db.pool())
            .await?;
        row.as_ref().map(account_from_row).transpose()
    }

    pub async fn by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_ACCOUNT} WHERE username = ?"))
            .bind(username)
            .fetch_optional(self.db.pool())
            .await?;
        row.as_ref().map(account_from_row).transpose()
    }

    pub async fn by_account_number(&self, number: &str) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_ACCOUNT} WHERE account_number = ?"))
            .bind(number)
            .fetch_optional(self.db.pool())
            .await?;
        row.as_ref().map(account_from_row).transpose()
    }

    /// Resolve a recipient the way callers type them: a username or a
    /// 10-digit account number.
    pub async fn resolve(&self, identifier: &str) -> Result<Option<Account>, StoreError> {
        if let Some(account) = self.by_username(identifier).await? {
            return Ok(Some(account));
        }
        self.by_account_number(identifier).await
    }

    /// Every account, ordered by creation.
    pub async fn all(&self) -> Result<Vec<Account>, StoreError> {
        let rows = sqlx::query(&format!("{SELECT_ACCOUNT} ORDER BY id"))
            .fetch_all(self.db.pool())
            .await?;
        rows.iter().map(account_from_row).collect()
    }

    pub async fn update_password(
        &self,
        id: AccountId,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE accounts SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id.get())
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    /// Random 10-digit account number, retried until unused.
    async fn generate_account_number(&self) -> Result<String, StoreError> {
        loop {
            let candidate = {
                let mut rng = rand::thread_rng();
                format!("{:010}", rng.gen_range(0u64..10_000_000_000))
            };
            let taken: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM accounts WHERE account_number = ?)")
                    .bind(&candidate)
                    .fetch_one(self.db.pool())
                    .await?;
            if !taken {
                return Ok(candidate);
            }
        }
    }
}
