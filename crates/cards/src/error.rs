//! Card errors

use chrono::Duration;
use thiserror::Error;

/// Errors from card derivation and refresh
#[derive(Error, Debug)]
pub enum CardError {
    #[error(
        "Card can only be refreshed once per day; {}h{:02}m remaining",
        .remaining.num_hours(),
        .remaining.num_minutes() % 60
    )]
    RefreshTooSoon { remaining: Duration },

    #[error("No active card for this account")]
    NoActiveCard,

    #[error(transparent)]
    Store(#[from] minibank_store::StoreError),
}

impl From<sqlx::Error> for CardError {
    fn from(err: sqlx::Error) -> Self {
        CardError::Store(minibank_store::StoreError::Database(err))
    }
}
