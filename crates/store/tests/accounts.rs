//! Integration tests for the account and session stores

use chrono::{Duration, Utc};
use minibank_store::{AccountStore, Db, SessionStore};
use tempfile::TempDir;

async fn setup() -> (TempDir, AccountStore) {
    let dir = TempDir::new().unwrap();
    let db = Db::connect(dir.path().join("bank.db")).await.unwrap();
    (dir, AccountStore::new(db))
}

#[tokio::test]
async fn create_assigns_a_unique_ten_digit_number() {
    let (_dir, accounts) = setup().await;

    let alice = accounts
        .create("alice", "alice@example.com", "hash")
        .await
        .unwrap();
    let bob = accounts
        .create("bob", "bob@example.com", "hash")
        .await
        .unwrap();

    assert_eq!(alice.account_number.len(), 10);
    assert!(alice.account_number.chars().all(|c| c.is_ascii_digit()));
    assert_ne!(alice.account_number, bob.account_number);
    assert!(alice.balance.is_zero());
}

#[tokio::test]
async fn lookups_by_each_key() {
    let (_dir, accounts) = setup().await;
    let alice = accounts
        .create("alice", "alice@example.com", "hash")
        .await
        .unwrap();

    assert_eq!(accounts.get(alice.id).await.unwrap().unwrap().id, alice.id);
    assert_eq!(
        accounts.by_username("alice").await.unwrap().unwrap().id,
        alice.id
    );
    assert_eq!(
        accounts
            .by_account_number(&alice.account_number)
            .await
            .unwrap()
            .unwrap()
            .id,
        alice.id
    );
    assert!(accounts.by_username("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn resolve_prefers_usernames_over_account_numbers() {
    let (_dir, accounts) = setup().await;
    let alice = accounts
        .create("alice", "alice@example.com", "hash")
        .await
        .unwrap();

    // A username that happens to look like Alice's account number must
    // shadow it, matching the resolution order.
    let shadow = accounts
        .create(&alice.account_number, "shadow@example.com", "hash")
        .await
        .unwrap();

    let resolved = accounts
        .resolve(&alice.account_number)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.id, shadow.id);
}

#[tokio::test]
async fn sessions_expire_and_delete() {
    let dir = TempDir::new().unwrap();
    let db = Db::connect(dir.path().join("bank.db")).await.unwrap();
    let accounts = AccountStore::new(db.clone());
    let sessions = SessionStore::new(db);

    let alice = accounts
        .create("alice", "alice@example.com", "hash")
        .await
        .unwrap();

    sessions
        .insert(alice.id, "live", Utc::now() + Duration::hours(1))
        .await
        .unwrap();
    sessions
        .insert(alice.id, "stale", Utc::now() - Duration::hours(1))
        .await
        .unwrap();

    assert!(sessions.find_valid("live", Utc::now()).await.unwrap().is_some());
    assert!(sessions.find_valid("stale", Utc::now()).await.unwrap().is_none());
    assert!(sessions.find_valid("missing", Utc::now()).await.unwrap().is_none());

    sessions.delete_all_for(alice.id).await.unwrap();
    assert!(sessions.find_valid("live", Utc::now()).await.unwrap().is_none());
}
