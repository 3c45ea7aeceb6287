//! Payment requests
//!
//! A solicitation for money from one account to another. Created by the
//! requester, answered by the target (approve/reject) or withdrawn by the
//! requester (cancel), and only while `pending`. Terminal states are final.

use chrono::{DateTime, Utc};
use minibank_core::{AccountId, Amount, RequestId};
use minibank_store::db::{parse_decimal, parse_timestamp};
use minibank_store::StoreError;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use strum_macros::{Display, EnumString};

/// Lifecycle of a payment request; `pending` is the only non-terminal state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

/// A money "pull": `from_account` asks `to_account` to pay `amount`.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRequest {
    pub id: RequestId,
    pub from_account: AccountId,
    pub to_account: AccountId,
    pub amount: Amount,
    pub reason: String,
    pub message: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub from_username: Option<String>,
    pub to_username: Option<String>,
}

pub(crate) fn request_from_row(row: &SqliteRow) -> Result<PaymentRequest, StoreError> {
    let amount_raw: String = row.try_get("amount")?;
    let status_raw: String = row.try_get("status")?;
    let created_raw: String = row.try_get("created_at")?;

    Ok(PaymentRequest {
        id: RequestId(row.try_get("id")?),
        from_account: AccountId(row.try_get("from_account")?),
        to_account: AccountId(row.try_get("to_account")?),
        amount: Amount::new_unchecked(parse_decimal("amount", &amount_raw)?),
        reason: row.try_get("reason")?,
        message: row.try_get("message")?,
        status: status_raw
            .parse()
            .map_err(|_| StoreError::corrupt("status", &status_raw))?,
        created_at: parse_timestamp("created_at", &created_raw)?,
        from_username: row.try_get("from_username").ok(),
        to_username: row.try_get("to_username").ok(),
    })
}

pub(crate) const SELECT_REQUEST: &str = r#"
    SELECT pr.id, pr.from_account, pr.to_account, pr.amount, pr.reason,
           pr.message, pr.status, pr.created_at,
           u1.username AS from_username, u2.username AS to_username
    FROM payment_requests pr
    LEFT JOIN accounts u1 ON pr.from_account = u1.id
    LEFT JOIN accounts u2 ON pr.to_account = u2.id
"#;
