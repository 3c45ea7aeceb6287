//! CLI commands

use crate::context::AppContext;
use minibank_core::{Amount, RequestId};
use minibank_ledger::{PaymentRequest, Transaction};
use rust_decimal::Decimal;
use serde_json::json;

/// Initialize the store and the reserve account.
pub async fn init(ctx: &AppContext) -> anyhow::Result<()> {
    if ctx.init().await? {
        println!("✅ Reserve account created and pinned");
    } else {
        println!("Reserve account already present; balance re-pinned");
    }
    Ok(())
}

/// Register a new user account.
pub async fn register(
    ctx: &AppContext,
    username: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    let account = ctx.register(username, email, password).await?;
    println!(
        "✅ Account created: {} (account number {}, balance {})",
        account.username, account.account_number, account.balance
    );
    Ok(())
}

/// Log in and print a bearer token.
pub async fn login(ctx: &AppContext, username: &str, password: &str) -> anyhow::Result<()> {
    let (token, account) = ctx.gateway.login(username, password).await?;
    println!("✅ Logged in as {}", account.username);
    println!("{token}");
    Ok(())
}

pub async fn logout(ctx: &AppContext, token: &str) -> anyhow::Result<()> {
    ctx.gateway.logout(token).await?;
    println!("Logged out");
    Ok(())
}

pub async fn whoami(ctx: &AppContext, token: &str) -> anyhow::Result<()> {
    let account = ctx.caller(token).await?;
    println!("{}", serde_json::to_string_pretty(&account)?);
    Ok(())
}

/// Change the caller's password; all sessions are invalidated.
pub async fn change_password(
    ctx: &AppContext,
    token: &str,
    current: &str,
    new: &str,
) -> anyhow::Result<()> {
    let account = ctx.caller(token).await?;
    ctx.gateway.change_password(account.id, current, new).await?;
    println!("✅ Password changed; log in again with the new password");
    Ok(())
}

pub async fn balance(ctx: &AppContext, token: &str) -> anyhow::Result<()> {
    let account = ctx.caller(token).await?;
    let balance = ctx.ledger.balance(account.id).await?;
    println!("Balance for {}: {}", account.username, balance);
    Ok(())
}

pub async fn transfer(
    ctx: &AppContext,
    token: &str,
    to: &str,
    amount: Amount,
    description: &str,
) -> anyhow::Result<()> {
    let tx = ctx.transfer(token, to, amount, description).await?;
    println!(
        "✅ Transferred {} to {} (transaction {})",
        tx.amount,
        tx.to_username.as_deref().unwrap_or("?"),
        tx.id
    );
    Ok(())
}

pub async fn transactions(ctx: &AppContext, token: &str, limit: i64) -> anyhow::Result<()> {
    let account = ctx.caller(token).await?;
    let history = ctx.ledger.transactions_for(account.id, limit).await?;
    print_transactions(&history);
    Ok(())
}

pub async fn request(
    ctx: &AppContext,
    token: &str,
    target: &str,
    amount: Amount,
    reason: &str,
    message: &str,
) -> anyhow::Result<()> {
    let request = ctx
        .create_request(token, target, amount, reason, message)
        .await?;
    println!(
        "✅ Requested {} from {} (request {})",
        request.amount,
        request.to_username.as_deref().unwrap_or("?"),
        request.id
    );
    Ok(())
}

pub async fn requests(ctx: &AppContext, token: &str) -> anyhow::Result<()> {
    let account = ctx.caller(token).await?;
    let (incoming, outgoing) = ctx.ledger.requests_for(account.id).await?;

    println!("Incoming ({}):", incoming.len());
    print_requests(&incoming);
    println!("Outgoing ({}):", outgoing.len());
    print_requests(&outgoing);
    Ok(())
}

pub async fn approve(ctx: &AppContext, token: &str, id: i64) -> anyhow::Result<()> {
    let tx = ctx.approve_request(token, RequestId(id)).await?;
    println!("✅ Request {} approved; paid {} (transaction {})", id, tx.amount, tx.id);
    Ok(())
}

pub async fn reject(ctx: &AppContext, token: &str, id: i64) -> anyhow::Result<()> {
    ctx.reject_request(token, RequestId(id)).await?;
    println!("Request {id} rejected");
    Ok(())
}

pub async fn cancel(ctx: &AppContext, token: &str, id: i64) -> anyhow::Result<()> {
    ctx.cancel_request(token, RequestId(id)).await?;
    println!("Request {id} cancelled");
    Ok(())
}

pub async fn adjust(
    ctx: &AppContext,
    admin_key: &str,
    target: &str,
    amount: Decimal,
    description: &str,
) -> anyhow::Result<()> {
    let tx = ctx.adjust(admin_key, target, amount, description).await?;
    println!(
        "✅ Adjusted {} by {} (transaction {})",
        if amount > Decimal::ZERO {
            tx.to_username.as_deref().unwrap_or("?")
        } else {
            tx.from_username.as_deref().unwrap_or("?")
        },
        amount,
        tx.id
    );
    Ok(())
}

pub async fn users(ctx: &AppContext, admin_key: &str) -> anyhow::Result<()> {
    let accounts = ctx.users(admin_key).await?;
    for account in accounts {
        println!(
            "{}",
            json!({
                "id": account.id,
                "username": account.username,
                "accountNumber": account.account_number,
                "balance": account.balance,
            })
        );
    }
    Ok(())
}

pub async fn card(ctx: &AppContext, token: &str) -> anyhow::Result<()> {
    let card = ctx.card(token).await?;
    println!("Card {} (expires {})", format_card_number(&card.card_number), card.expiry);
    if let Some(remaining) = ctx.cards.cooldown_remaining(&card) {
        println!(
            "Refresh available in {}h{:02}m",
            remaining.num_hours(),
            remaining.num_minutes() % 60
        );
    }
    Ok(())
}

pub async fn refresh_card(ctx: &AppContext, token: &str) -> anyhow::Result<()> {
    let card = ctx.refresh_card(token).await?;
    println!(
        "✅ New card {} (generation {}, expires {})",
        format_card_number(&card.card_number),
        card.generation,
        card.expiry
    );
    Ok(())
}

fn print_transactions(history: &[Transaction]) {
    for tx in history {
        println!(
            "{}",
            json!({
                "id": tx.id,
                "from": tx.from_username,
                "to": tx.to_username,
                "amount": tx.amount,
                "kind": tx.kind,
                "description": tx.description,
                "status": tx.status,
                "createdAt": tx.created_at,
            })
        );
    }
}

fn print_requests(requests: &[PaymentRequest]) {
    for request in requests {
        println!(
            "{}",
            json!({
                "id": request.id,
                "from": request.from_username,
                "to": request.to_username,
                "amount": request.amount,
                "reason": request.reason,
                "message": request.message,
                "status": request.status,
            })
        );
    }
}

/// Groups of four for display, like the embossed number.
fn format_card_number(number: &str) -> String {
    number
        .as_bytes()
        .chunks(4)
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(" ")
}
