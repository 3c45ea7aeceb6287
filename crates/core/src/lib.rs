//! Minibank Core - Domain types
//!
//! This crate contains the fundamental types used across Minibank:
//! - `Amount`: Non-negative two-decimal wrapper for money
//! - Typed row identifiers (`AccountId`, `TransactionId`, ...)

pub mod amount;
pub mod id;

pub use amount::{Amount, AmountError};
pub use id::{AccountId, CardId, RequestId, TransactionId};
