//! Database handle and schema bootstrap

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::path::Path;

/// Shared SQLite handle.
///
/// Cheap to clone; all components hold one and open short transactions
/// against the same pool.
#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Open (or create) the database file and bootstrap the schema.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let url = format!("sqlite:{}?mode=rwc", path.as_ref().display());
        let pool = SqlitePool::connect(&url).await?;
        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    /// The underlying pool, for components that run their own transactions.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                account_number TEXT UNIQUE NOT NULL,
                balance TEXT NOT NULL DEFAULT '0',
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                from_account INTEGER REFERENCES accounts(id),
                to_account INTEGER REFERENCES accounts(id),
                amount TEXT NOT NULL,
                kind TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'completed',
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS payment_requests (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                from_account INTEGER REFERENCES accounts(id),
                to_account INTEGER REFERENCES accounts(id),
                amount TEXT NOT NULL,
                reason TEXT NOT NULL,
                message TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS cards (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_id INTEGER REFERENCES accounts(id),
                card_number TEXT NOT NULL,
                expiry TEXT NOT NULL,
                generation INTEGER NOT NULL DEFAULT 0,
                last_refresh TEXT,
                active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_id INTEGER REFERENCES accounts(id),
                token TEXT UNIQUE NOT NULL,
                expires_at TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_accounts_username ON accounts(username)",
            "CREATE INDEX IF NOT EXISTS idx_accounts_number ON accounts(account_number)",
            "CREATE INDEX IF NOT EXISTS idx_transactions_from ON transactions(from_account)",
            "CREATE INDEX IF NOT EXISTS idx_transactions_to ON transactions(to_account)",
            "CREATE INDEX IF NOT EXISTS idx_requests_from ON payment_requests(from_account)",
            "CREATE INDEX IF NOT EXISTS idx_requests_to ON payment_requests(to_account)",
            "CREATE INDEX IF NOT EXISTS idx_sessions_token ON sessions(token)",
            "CREATE INDEX IF NOT EXISTS idx_cards_account ON cards(account_id)",
            "CREATE INDEX IF NOT EXISTS idx_cards_active ON cards(active)",
        ];

        for statement in statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        Ok(())
    }
}

/// Render a timestamp the way every table stores it.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

/// Parse a timestamp column written by [`format_timestamp`].
pub fn parse_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| StoreError::corrupt(column, raw))
}

/// Parse a decimal TEXT column.
pub fn parse_decimal(column: &str, raw: &str) -> Result<rust_decimal::Decimal, StoreError> {
    raw.parse()
        .map_err(|_| StoreError::corrupt(column, raw))
}
