//! Minibank Auth - the access gateway
//!
//! Resolves callers to account identities before anything touches the
//! ledger: registration with input validation, salted password hashes,
//! and bearer session tokens with a 24 hour expiry. The ledger itself
//! never sees a password or a token, only an `AuthenticatedIdentity`.

pub mod error;
pub mod gateway;
pub mod password;
pub mod validate;

pub use error::AuthError;
pub use gateway::{AccessGateway, AuthenticatedIdentity, SESSION_TTL_HOURS};
pub use password::{hash_password, verify_password};
pub use validate::validate_registration;
