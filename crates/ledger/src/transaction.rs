//! Transaction records
//!
//! Rows in `transactions` are written exactly once, by the engine, as the
//! last step of a successful mutation. They are never updated or deleted.

use chrono::{DateTime, Utc};
use minibank_core::{AccountId, TransactionId};
use minibank_store::db::{parse_decimal, parse_timestamp};
use minibank_store::StoreError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use strum_macros::{Display, EnumString};

/// Category of a balance movement
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Peer-to-peer transfer (including approved payment requests)
    Transfer,
    /// Credit from the reserve (onboarding)
    Deposit,
    /// Privileged signed adjustment
    AdminAdjustment,
}

/// Outcome recorded on the row
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Completed,
    Failed,
}

/// Immutable record of a completed balance movement.
///
/// `amount` is signed: admin debits are stored negative, exactly as they
/// were applied to the target's balance. `from_username`/`to_username`
/// are display fields joined in at read time.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub from_account: AccountId,
    pub to_account: AccountId,
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub description: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub from_username: Option<String>,
    pub to_username: Option<String>,
}

pub(crate) fn transaction_from_row(row: &SqliteRow) -> Result<Transaction, StoreError> {
    let amount_raw: String = row.try_get("amount")?;
    let kind_raw: String = row.try_get("kind")?;
    let status_raw: String = row.try_get("status")?;
    let created_raw: String = row.try_get("created_at")?;

    Ok(Transaction {
        id: TransactionId(row.try_get("id")?),
        from_account: AccountId(row.try_get("from_account")?),
        to_account: AccountId(row.try_get("to_account")?),
        amount: parse_decimal("amount", &amount_raw)?,
        kind: kind_raw
            .parse()
            .map_err(|_| StoreError::corrupt("kind", &kind_raw))?,
        description: row.try_get("description")?,
        status: status_raw
            .parse()
            .map_err(|_| StoreError::corrupt("status", &status_raw))?,
        created_at: parse_timestamp("created_at", &created_raw)?,
        from_username: row.try_get("from_username").ok(),
        to_username: row.try_get("to_username").ok(),
    })
}

/// SELECT with both party usernames joined in.
pub(crate) const SELECT_TRANSACTION: &str = r#"
    SELECT t.id, t.from_account, t.to_account, t.amount, t.kind,
           t.description, t.status, t.created_at,
           u1.username AS from_username, u2.username AS to_username
    FROM transactions t
    LEFT JOIN accounts u1 ON t.from_account = u1.id
    LEFT JOIN accounts u2 ON t.to_account = u2.id
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_string_forms() {
        assert_eq!(TransactionKind::Transfer.to_string(), "transfer");
        assert_eq!(TransactionKind::AdminAdjustment.to_string(), "admin_adjustment");
        assert_eq!(
            "deposit".parse::<TransactionKind>().unwrap(),
            TransactionKind::Deposit
        );
        assert!("refund".parse::<TransactionKind>().is_err());
    }

    #[test]
    fn status_string_forms() {
        assert_eq!(TransactionStatus::Completed.to_string(), "completed");
        assert_eq!(
            "failed".parse::<TransactionStatus>().unwrap(),
            TransactionStatus::Failed
        );
    }
}
