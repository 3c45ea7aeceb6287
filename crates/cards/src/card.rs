//! Card records

use chrono::{DateTime, Utc};
use minibank_core::{AccountId, CardId};
use minibank_store::db::parse_timestamp;
use minibank_store::StoreError;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// A derived virtual payment card.
///
/// Rows are never mutated after creation except for clearing the `active`
/// flag when a refresh supersedes them.
#[derive(Debug, Clone, Serialize)]
pub struct Card {
    pub id: CardId,
    pub account_id: AccountId,
    pub card_number: String,
    pub expiry: String,
    /// Refresh generation; increments by one per refresh.
    pub generation: i64,
    pub last_refresh: Option<DateTime<Utc>>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) fn card_from_row(row: &SqliteRow) -> Result<Card, StoreError> {
    let last_refresh_raw: Option<String> = row.try_get("last_refresh")?;
    let created_raw: String = row.try_get("created_at")?;
    let updated_raw: String = row.try_get("updated_at")?;

    Ok(Card {
        id: CardId(row.try_get("id")?),
        account_id: AccountId(row.try_get("account_id")?),
        card_number: row.try_get("card_number")?,
        expiry: row.try_get("expiry")?,
        generation: row.try_get("generation")?,
        last_refresh: last_refresh_raw
            .map(|raw| parse_timestamp("last_refresh", &raw))
            .transpose()?,
        active: row.try_get::<i64, _>("active")? != 0,
        created_at: parse_timestamp("created_at", &created_raw)?,
        updated_at: parse_timestamp("updated_at", &updated_raw)?,
    })
}

pub(crate) const SELECT_CARD: &str = r#"
    SELECT id, account_id, card_number, expiry, generation,
           last_refresh, active, created_at, updated_at
    FROM cards
"#;
