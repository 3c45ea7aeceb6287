//! Integration tests for the access gateway

use chrono::{Duration, Utc};
use minibank_auth::{AccessGateway, AuthError};
use minibank_store::{AccountStore, Db, SessionStore};
use tempfile::TempDir;

const RESERVED: &str = "MiniBank";

async fn setup() -> (TempDir, Db, AccessGateway) {
    let dir = TempDir::new().unwrap();
    let db = Db::connect(dir.path().join("bank.db")).await.unwrap();
    let gateway = AccessGateway::new(db.clone(), RESERVED, Some("hunter2-admin".into()));
    (dir, db, gateway)
}

#[tokio::test]
async fn register_login_resolve_logout() {
    let (_dir, _db, gateway) = setup().await;

    let account = gateway
        .register("alice", "alice@example.com", "sup3rsecret")
        .await
        .unwrap();
    assert_eq!(account.username, "alice");
    assert_eq!(account.account_number.len(), 10);

    let (token, logged_in) = gateway.login("alice", "sup3rsecret").await.unwrap();
    assert_eq!(logged_in.id, account.id);

    let identity = gateway.resolve(&token).await.unwrap();
    assert_eq!(identity.account_id, account.id);

    gateway.logout(&token).await.unwrap();
    assert!(matches!(
        gateway.resolve(&token).await,
        Err(AuthError::InvalidSession)
    ));
}

#[tokio::test]
async fn wrong_password_and_unknown_user_are_indistinguishable() {
    let (_dir, _db, gateway) = setup().await;
    gateway
        .register("alice", "alice@example.com", "sup3rsecret")
        .await
        .unwrap();

    assert!(matches!(
        gateway.login("alice", "wrongpass1").await,
        Err(AuthError::InvalidCredentials)
    ));
    assert!(matches!(
        gateway.login("mallory", "sup3rsecret").await,
        Err(AuthError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn duplicate_and_reserved_usernames_rejected() {
    let (_dir, _db, gateway) = setup().await;
    gateway
        .register("alice", "alice@example.com", "sup3rsecret")
        .await
        .unwrap();

    assert!(matches!(
        gateway.register("alice", "other@example.com", "sup3rsecret").await,
        Err(AuthError::UsernameTaken)
    ));
    assert!(matches!(
        gateway.register("minibank", "bank@example.com", "sup3rsecret").await,
        Err(AuthError::ReservedUsername)
    ));
}

#[tokio::test]
async fn reserve_account_logs_in_with_admin_key_only() {
    let (_dir, db, gateway) = setup().await;

    // The reserve row is bootstrapped with an unusable password marker.
    let accounts = AccountStore::new(db.clone());
    accounts
        .create(RESERVED, "reserve@minibank.test", "!")
        .await
        .unwrap();

    assert!(matches!(
        gateway.login(RESERVED, "not-the-key").await,
        Err(AuthError::InvalidCredentials)
    ));
    let (token, account) = gateway.login(RESERVED, "hunter2-admin").await.unwrap();
    assert_eq!(account.username, RESERVED);
    gateway.resolve(&token).await.unwrap();

    // Without an admin key configured the reserve cannot log in at all.
    let keyless = AccessGateway::new(db, RESERVED, None);
    assert!(matches!(
        keyless.login(RESERVED, "hunter2-admin").await,
        Err(AuthError::AdminKeyUnavailable)
    ));
}

#[tokio::test]
async fn expired_sessions_do_not_resolve() {
    let (_dir, db, gateway) = setup().await;
    let account = gateway
        .register("alice", "alice@example.com", "sup3rsecret")
        .await
        .unwrap();

    let sessions = SessionStore::new(db);
    sessions
        .insert(account.id, "stale-token", Utc::now() - Duration::hours(1))
        .await
        .unwrap();

    assert!(matches!(
        gateway.resolve("stale-token").await,
        Err(AuthError::InvalidSession)
    ));

    let purged = sessions.purge_expired(Utc::now()).await.unwrap();
    assert_eq!(purged, 1);
}

#[tokio::test]
async fn change_password_invalidates_sessions() {
    let (_dir, _db, gateway) = setup().await;
    let account = gateway
        .register("alice", "alice@example.com", "sup3rsecret")
        .await
        .unwrap();
    let (token, _) = gateway.login("alice", "sup3rsecret").await.unwrap();

    assert!(matches!(
        gateway
            .change_password(account.id, "wrongpass1", "newsecret2")
            .await,
        Err(AuthError::InvalidCredentials)
    ));
    assert!(matches!(
        gateway
            .change_password(account.id, "sup3rsecret", "weak")
            .await,
        Err(AuthError::WeakPassword)
    ));

    gateway
        .change_password(account.id, "sup3rsecret", "newsecret2")
        .await
        .unwrap();

    // Old token is gone; old password no longer works.
    assert!(matches!(
        gateway.resolve(&token).await,
        Err(AuthError::InvalidSession)
    ));
    assert!(matches!(
        gateway.login("alice", "sup3rsecret").await,
        Err(AuthError::InvalidCredentials)
    ));
    gateway.login("alice", "newsecret2").await.unwrap();
}
