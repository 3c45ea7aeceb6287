//! Store errors

use thiserror::Error;

/// Errors from the persistence layer
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Build a `Corrupt` error for a column that failed to parse.
    pub fn corrupt(column: &str, value: impl std::fmt::Display) -> Self {
        StoreError::Corrupt(format!("{column}: {value}"))
    }
}
