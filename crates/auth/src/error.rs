//! Auth errors

use thiserror::Error;

/// Errors from registration, login and session resolution
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Username must be 3-20 characters of letters, numbers and underscores")]
    InvalidUsername,

    #[error("This username is reserved and cannot be used")]
    ReservedUsername,

    #[error("Invalid email address format")]
    InvalidEmail,

    #[error("Password must be at least 8 characters with at least one letter and one number")]
    WeakPassword,

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Session is invalid or expired")]
    InvalidSession,

    #[error("Reserve login is not available without an admin key")]
    AdminKeyUnavailable,

    #[error("Password cannot be changed for the reserve account")]
    ReservePasswordImmutable,

    #[error(transparent)]
    Store(#[from] minibank_store::StoreError),
}
