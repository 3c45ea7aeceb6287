//! Access gateway - authenticates callers and resolves identities

use crate::error::AuthError;
use crate::password::{hash_password, verify_password};
use crate::validate::{validate_password, validate_registration};
use chrono::{Duration, Utc};
use constant_time_eq::constant_time_eq;
use minibank_core::AccountId;
use minibank_store::{Account, AccountStore, Db, SessionStore};
use rand::RngCore;

/// Sessions expire this many hours after login.
pub const SESSION_TTL_HOURS: i64 = 24;

/// The result of resolving a bearer token: who is calling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    pub account_id: AccountId,
}

/// Authenticates callers before any ledger call.
///
/// The reserve account has no usable password; it logs in with the admin
/// key supplied at construction, if one was.
#[derive(Clone)]
pub struct AccessGateway {
    accounts: AccountStore,
    sessions: SessionStore,
    reserved_username: String,
    admin_key: Option<String>,
}

impl AccessGateway {
    pub fn new(db: Db, reserved_username: impl Into<String>, admin_key: Option<String>) -> Self {
        Self {
            accounts: AccountStore::new(db.clone()),
            sessions: SessionStore::new(db),
            reserved_username: reserved_username.into(),
            admin_key,
        }
    }

    /// Validate and create a new account. The caller is responsible for
    /// granting the onboarding credit through the ledger afterwards.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Account, AuthError> {
        validate_registration(username, email, password, &self.reserved_username)?;

        if self.accounts.by_username(username).await?.is_some() {
            return Err(AuthError::UsernameTaken);
        }

        let account = self
            .accounts
            .create(username, email, &hash_password(password))
            .await?;
        tracing::info!(account = %account.id, username, "account registered");
        Ok(account)
    }

    /// Verify credentials and mint a bearer token.
    pub async fn login(&self, username: &str, password: &str) -> Result<(String, Account), AuthError> {
        let account = self
            .accounts
            .by_username(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let valid = if account.username == self.reserved_username {
            let key = self
                .admin_key
                .as_deref()
                .ok_or(AuthError::AdminKeyUnavailable)?;
            constant_time_eq(key.as_bytes(), password.as_bytes())
        } else {
            verify_password(&account.password_hash, password)
        };
        if !valid {
            return Err(AuthError::InvalidCredentials);
        }

        let token = generate_token();
        let expires_at = Utc::now() + Duration::hours(SESSION_TTL_HOURS);
        self.sessions.insert(account.id, &token, expires_at).await?;
        tracing::info!(account = %account.id, "login");
        Ok((token, account))
    }

    /// Resolve a bearer token to the calling identity.
    pub async fn resolve(&self, token: &str) -> Result<AuthenticatedIdentity, AuthError> {
        let session = self
            .sessions
            .find_valid(token, Utc::now())
            .await?
            .ok_or(AuthError::InvalidSession)?;
        Ok(AuthenticatedIdentity {
            account_id: session.account_id,
        })
    }

    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.sessions.delete(token).await?;
        Ok(())
    }

    /// Change a password and force re-login everywhere.
    pub async fn change_password(
        &self,
        account_id: AccountId,
        current: &str,
        new: &str,
    ) -> Result<(), AuthError> {
        let account = self
            .accounts
            .get(account_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if account.username == self.reserved_username {
            return Err(AuthError::ReservePasswordImmutable);
        }
        if !verify_password(&account.password_hash, current) {
            return Err(AuthError::InvalidCredentials);
        }
        validate_password(new)?;

        self.accounts
            .update_password(account_id, &hash_password(new))
            .await?;
        self.sessions.delete_all_for(account_id).await?;
        tracing::info!(account = %account_id, "password changed; sessions invalidated");
        Ok(())
    }

    /// Account lookup for callers that already hold an identity.
    pub async fn account(&self, identity: AuthenticatedIdentity) -> Result<Account, AuthError> {
        self.accounts
            .get(identity.account_id)
            .await?
            .ok_or(AuthError::InvalidSession)
    }
}

/// 32 random bytes, hex encoded.
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
