//! Minibank Store - SQLite persistence
//!
//! Owns the database handle, the schema bootstrap, and read access to
//! `accounts` and `sessions`. Balance writes are reserved for the ledger
//! engine; card writes for the card service. Everything here is plain
//! `sqlx` against a single SQLite file.

pub mod account;
pub mod db;
pub mod error;
pub mod session;

pub use account::{Account, AccountStore};
pub use db::Db;
pub use error::StoreError;
pub use session::{Session, SessionStore};
