//! Minibank Ledger - the transaction engine
//!
//! This is the HEART of Minibank. Every balance mutation goes through this
//! crate: peer-to-peer transfers, the payment-request lifecycle, admin
//! adjustments and the onboarding credit. Each operation runs as one SQLite
//! transaction, so a failure at any step rolls the whole unit back; the
//! store's isolation is the only concurrency control.
//!
//! # Key types
//! - `LedgerEngine`: executes the mutations
//! - `Transaction`: immutable record of a completed movement
//! - `PaymentRequest`: a pending/terminal money solicitation
//! - `LedgerError`: domain-typed failures, never retried internally

pub mod engine;
pub mod error;
pub mod request;
pub mod transaction;

pub use engine::{onboarding_credit, reserve_balance, LedgerEngine, RESERVE_USERNAME};
pub use error::LedgerError;
pub use request::{PaymentRequest, RequestStatus};
pub use transaction::{Transaction, TransactionKind, TransactionStatus};
