//! Ledger errors

use thiserror::Error;

/// Errors that can occur in ledger operations.
///
/// These surface directly to the caller; the engine never retries. Any
/// error raised inside a mutation unit aborts all of that unit's writes.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Amount must be positive and no finer than cents")]
    InvalidAmount,

    #[error("Insufficient balance")]
    InsufficientFunds,

    #[error("Recipient account not found")]
    RecipientNotFound,

    #[error("Cannot transact with yourself")]
    SelfTransfer,

    #[error("Account not found")]
    NotFound,

    #[error("Payment request not found or already processed")]
    AlreadyProcessed,

    #[error("Reserve account is missing; run init first")]
    ReserveMissing,

    #[error(transparent)]
    Store(#[from] minibank_store::StoreError),
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::Store(minibank_store::StoreError::Database(err))
    }
}
