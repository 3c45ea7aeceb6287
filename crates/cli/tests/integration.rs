//! End-to-end tests: gateway -> ledger -> store, wired as the binary
//! wires them.

use minibank_cli::{AppContext, Config};
use minibank_core::Amount;
use minibank_ledger::{RequestStatus, TransactionKind, TransactionStatus};
use rust_decimal_macros::dec;
use tempfile::TempDir;

const ADMIN_KEY: &str = "test-admin-key";

async fn setup() -> (TempDir, AppContext) {
    let dir = TempDir::new().unwrap();
    let ctx = AppContext::new(Config {
        data_dir: dir.path().to_path_buf(),
        webhook_url: None,
        admin_key: Some(ADMIN_KEY.into()),
    })
    .await
    .unwrap();
    ctx.init().await.unwrap();
    (dir, ctx)
}

fn amount(value: rust_decimal::Decimal) -> Amount {
    Amount::new(value).unwrap()
}

#[tokio::test]
async fn transfer_end_to_end() {
    let (_dir, ctx) = setup().await;

    // Two fresh accounts, each with the 1000 onboarding credit.
    let alice = ctx
        .register("alice", "alice@example.com", "sup3rsecret")
        .await
        .unwrap();
    let bob = ctx
        .register("bob", "bob@example.com", "sup3rsecret")
        .await
        .unwrap();
    assert_eq!(alice.balance.value(), dec!(1000));
    assert_eq!(bob.balance.value(), dec!(1000));

    let (token, _) = ctx.gateway.login("alice", "sup3rsecret").await.unwrap();

    let tx = ctx
        .transfer(&token, "bob", amount(dec!(200)), "rent")
        .await
        .unwrap();
    assert_eq!(tx.amount, dec!(200));
    assert_eq!(tx.status, TransactionStatus::Completed);
    assert_eq!(tx.description, "rent");

    assert_eq!(
        ctx.ledger.balance(alice.id).await.unwrap().value(),
        dec!(800)
    );
    assert_eq!(ctx.ledger.balance(bob.id).await.unwrap().value(), dec!(1200));
}

#[tokio::test]
async fn payment_request_end_to_end() {
    let (_dir, ctx) = setup().await;
    let alice = ctx
        .register("alice", "alice@example.com", "sup3rsecret")
        .await
        .unwrap();
    let bob = ctx
        .register("bob", "bob@example.com", "sup3rsecret")
        .await
        .unwrap();

    let (bob_token, _) = ctx.gateway.login("bob", "sup3rsecret").await.unwrap();
    let (alice_token, _) = ctx.gateway.login("alice", "sup3rsecret").await.unwrap();

    // Bob asks Alice for 50 for lunch.
    let request = ctx
        .create_request(&bob_token, "alice", amount(dec!(50)), "lunch", "")
        .await
        .unwrap();
    assert_eq!(request.status, RequestStatus::Pending);

    // Alice sees it incoming and approves.
    let (incoming, _) = ctx.ledger.requests_for(alice.id).await.unwrap();
    assert_eq!(incoming.len(), 1);

    let tx = ctx.approve_request(&alice_token, request.id).await.unwrap();
    assert_eq!(tx.kind, TransactionKind::Transfer);
    assert_eq!(tx.amount, dec!(50));
    assert_eq!(tx.from_username.as_deref(), Some("alice"));
    assert_eq!(tx.to_username.as_deref(), Some("bob"));

    assert_eq!(
        ctx.ledger.request_by_id(request.id).await.unwrap().status,
        RequestStatus::Approved
    );
    assert_eq!(
        ctx.ledger.balance(alice.id).await.unwrap().value(),
        dec!(950)
    );
    assert_eq!(ctx.ledger.balance(bob.id).await.unwrap().value(), dec!(1050));

    // A second approval reports the race loss.
    let again = ctx.approve_request(&alice_token, request.id).await;
    let err = again.unwrap_err().to_string();
    assert!(err.contains("already processed"), "unexpected error: {err}");
}

#[tokio::test]
async fn admin_adjust_requires_the_key() {
    let (_dir, ctx) = setup().await;
    let alice = ctx
        .register("alice", "alice@example.com", "sup3rsecret")
        .await
        .unwrap();

    let denied = ctx.adjust("wrong-key", "alice", dec!(100), "bonus").await;
    assert!(denied.is_err());
    assert_eq!(
        ctx.ledger.balance(alice.id).await.unwrap().value(),
        dec!(1000)
    );

    let tx = ctx
        .adjust(ADMIN_KEY, "alice", dec!(100), "bonus")
        .await
        .unwrap();
    assert_eq!(tx.kind, TransactionKind::AdminAdjustment);
    assert_eq!(
        ctx.ledger.balance(alice.id).await.unwrap().value(),
        dec!(1100)
    );

    let listed = ctx.users(ADMIN_KEY).await.unwrap();
    assert!(listed.iter().any(|a| a.username == "alice"));
}

#[tokio::test]
async fn card_flow_with_cooldown() {
    let (_dir, ctx) = setup().await;
    ctx.register("alice", "alice@example.com", "sup3rsecret")
        .await
        .unwrap();
    let (token, _) = ctx.gateway.login("alice", "sup3rsecret").await.unwrap();

    let card = ctx.card(&token).await.unwrap();
    assert_eq!(card.generation, 0);
    assert_eq!(card.card_number.len(), 16);

    let refreshed = ctx.refresh_card(&token).await.unwrap();
    assert_eq!(refreshed.generation, 1);
    assert_ne!(refreshed.card_number, card.card_number);

    let too_soon = ctx.refresh_card(&token).await;
    let err = too_soon.unwrap_err().to_string();
    assert!(err.contains("once per day"), "unexpected error: {err}");
}

#[tokio::test]
async fn unauthenticated_calls_are_rejected() {
    let (_dir, ctx) = setup().await;
    ctx.register("alice", "alice@example.com", "sup3rsecret")
        .await
        .unwrap();

    let result = ctx
        .transfer("bogus-token", "alice", amount(dec!(1)), "")
        .await;
    let err = result.unwrap_err().to_string();
    assert!(err.contains("invalid or expired"), "unexpected error: {err}");
}

#[tokio::test]
async fn reserved_username_cannot_register() {
    let (_dir, ctx) = setup().await;
    let result = ctx
        .register("minibank", "fake@example.com", "sup3rsecret")
        .await;
    assert!(result.is_err());
}
