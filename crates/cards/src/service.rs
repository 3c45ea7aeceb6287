//! Card service - one active card per account, refresh with cooldown

use crate::card::{card_from_row, Card, SELECT_CARD};
use crate::derive::{derive_card_number, expiry_label};
use crate::error::CardError;
use chrono::{DateTime, Duration, Utc};
use minibank_core::AccountId;
use minibank_store::db::{format_timestamp, Db};
use minibank_store::Account;

/// Minimum time between refreshes of the same account's card.
pub const REFRESH_COOLDOWN_HOURS: i64 = 24;

/// Owns the `cards` table. Reads the owning account's number as the
/// derivation seed; never touches balances.
#[derive(Clone)]
pub struct CardService {
    db: Db,
}

impl CardService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// The account's active card, created at generation 0 on first access.
    pub async fn current_card(&self, account: &Account) -> Result<Card, CardError> {
        if let Some(card) = self.active_card(account.id).await? {
            return Ok(card);
        }
        self.create_card(account, Utc::now()).await
    }

    /// Refresh the active card now.
    pub async fn refresh(&self, account: &Account) -> Result<Card, CardError> {
        self.refresh_at(account, Utc::now()).await
    }

    /// Refresh with an explicit clock. Deactivates the current card and
    /// creates generation + 1 in one unit; fails with `RefreshTooSoon`
    /// inside the cooldown window.
    pub async fn refresh_at(
        &self,
        account: &Account,
        now: DateTime<Utc>,
    ) -> Result<Card, CardError> {
        let current = self
            .active_card(account.id)
            .await?
            .ok_or(CardError::NoActiveCard)?;

        if let Some(remaining) = time_until_refresh(&current, now) {
            return Err(CardError::RefreshTooSoon { remaining });
        }

        let mut unit = self.db.pool().begin().await?;

        sqlx::query("UPDATE cards SET active = 0, updated_at = ? WHERE id = ?")
            .bind(format_timestamp(now))
            .bind(current.id.get())
            .execute(&mut *unit)
            .await?;

        let generation = current.generation + 1;
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO cards (account_id, card_number, expiry, generation, last_refresh, active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 1, ?, ?)
            RETURNING id
            "#,
        )
        .bind(account.id.get())
        .bind(derive_card_number(&account.account_number, generation))
        .bind(expiry_label(now))
        .bind(generation)
        .bind(format_timestamp(now))
        .bind(format_timestamp(now))
        .bind(format_timestamp(now))
        .fetch_one(&mut *unit)
        .await?;

        unit.commit().await?;
        tracing::debug!(account = %account.id, generation, "card refreshed");

        self.card_by_id(id).await
    }

    /// Time remaining before `refresh` is allowed, if any.
    pub fn cooldown_remaining(&self, card: &Card) -> Option<Duration> {
        time_until_refresh(card, Utc::now())
    }

    async fn active_card(&self, account_id: AccountId) -> Result<Option<Card>, CardError> {
        let sql = format!(
            "{SELECT_CARD} WHERE account_id = ? AND active = 1 ORDER BY created_at DESC LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(account_id.get())
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row.as_ref().map(card_from_row).transpose()?)
    }

    /// First card for an account: generation 0, no refresh stamp.
    async fn create_card(&self, account: &Account, now: DateTime<Utc>) -> Result<Card, CardError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO cards (account_id, card_number, expiry, generation, last_refresh, active, created_at, updated_at)
            VALUES (?, ?, ?, 0, NULL, 1, ?, ?)
            RETURNING id
            "#,
        )
        .bind(account.id.get())
        .bind(derive_card_number(&account.account_number, 0))
        .bind(expiry_label(now))
        .bind(format_timestamp(now))
        .bind(format_timestamp(now))
        .fetch_one(self.db.pool())
        .await?;

        self.card_by_id(id).await
    }

    async fn card_by_id(&self, id: i64) -> Result<Card, CardError> {
        let sql = format!("{SELECT_CARD} WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or(CardError::NoActiveCard)?;
        Ok(card_from_row(&row)?)
    }
}

/// None if the card may be refreshed at `now`; otherwise the remaining wait.
fn time_until_refresh(card: &Card, now: DateTime<Utc>) -> Option<Duration> {
    let last = card.last_refresh?;
    let next = last + Duration::hours(REFRESH_COOLDOWN_HOURS);
    if now >= next {
        None
    } else {
        Some(next - now)
    }
}
