//! Application context - wires everything together
//!
//! Mirrors the flow of the banking service: the gateway resolves the
//! caller, the ledger (or card service) performs the atomic mutation, and
//! only after it returns does the notifier get a copy of the result.

use anyhow::{bail, Context as _};
use constant_time_eq::constant_time_eq;
use minibank_auth::AccessGateway;
use minibank_cards::{Card, CardService};
use minibank_core::{Amount, RequestId};
use minibank_ledger::{LedgerEngine, PaymentRequest, Transaction, RESERVE_USERNAME};
use minibank_notify::{Notifier, NotifyEvent, WebhookSink};
use minibank_store::{Account, AccountStore, Db};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;

/// Explicit configuration; nothing below this layer reads the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the SQLite database file.
    pub data_dir: PathBuf,
    /// Webhook endpoint for the notification sink; `None` disables it.
    pub webhook_url: Option<String>,
    /// Key authorizing admin operations and the reserve login.
    pub admin_key: Option<String>,
}

/// Application context - wires together all components.
pub struct AppContext {
    pub accounts: AccountStore,
    pub ledger: LedgerEngine,
    pub cards: CardService,
    pub gateway: AccessGateway,
    pub notifier: Notifier,
    admin_key: Option<String>,
}

impl AppContext {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.data_dir)
            .with_context(|| format!("creating data dir {}", config.data_dir.display()))?;

        let db = Db::connect(config.data_dir.join("minibank.db")).await?;
        let accounts = AccountStore::new(db.clone());
        let ledger = LedgerEngine::new(db.clone());
        let cards = CardService::new(db.clone());
        let gateway = AccessGateway::new(db, RESERVE_USERNAME, config.admin_key.clone());

        let notifier = match config.webhook_url.as_deref() {
            Some(url) if !url.is_empty() => Notifier::new(Arc::new(WebhookSink::new(url))),
            _ => Notifier::disabled(),
        };

        let ctx = Self {
            accounts,
            ledger,
            cards,
            gateway,
            notifier,
            admin_key: config.admin_key,
        };

        // Startup repin; a false return just means init has not run yet.
        ctx.ledger.ensure_reserve_invariant().await?;

        Ok(ctx)
    }

    /// Create the reserve account if absent and pin its balance.
    /// Returns true if the account was created by this call.
    pub async fn init(&self) -> anyhow::Result<bool> {
        let created = if self.accounts.by_username(RESERVE_USERNAME).await?.is_none() {
            // Unusable password marker; the reserve logs in via admin key.
            self.accounts
                .create(RESERVE_USERNAME, "reserve@minibank.invalid", "!")
                .await?;
            true
        } else {
            false
        };
        self.ledger.ensure_reserve_invariant().await?;
        Ok(created)
    }

    /// Register a user and grant the onboarding credit.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> anyhow::Result<Account> {
        let account = self.gateway.register(username, email, password).await?;
        self.ledger.grant_onboarding_credit(account.id).await?;
        self.accounts
            .get(account.id)
            .await?
            .context("account vanished after registration")
    }

    /// Resolve the caller's account from a bearer token.
    pub async fn caller(&self, token: &str) -> anyhow::Result<Account> {
        let identity = self.gateway.resolve(token).await?;
        Ok(self.gateway.account(identity).await?)
    }

    pub async fn transfer(
        &self,
        token: &str,
        to: &str,
        amount: Amount,
        description: &str,
    ) -> anyhow::Result<Transaction> {
        let caller = self.caller(token).await?;
        let transaction = self
            .ledger
            .transfer(caller.id, to, amount, description)
            .await?;
        self.notifier
            .send(NotifyEvent::TransferCompleted(transaction.clone()));
        Ok(transaction)
    }

    pub async fn create_request(
        &self,
        token: &str,
        target: &str,
        amount: Amount,
        reason: &str,
        message: &str,
    ) -> anyhow::Result<PaymentRequest> {
        let caller = self.caller(token).await?;
        let request = self
            .ledger
            .create_payment_request(caller.id, target, amount, reason, message)
            .await?;
        self.notifier
            .send(NotifyEvent::PaymentRequestCreated(request.clone()));
        Ok(request)
    }

    pub async fn approve_request(
        &self,
        token: &str,
        request: RequestId,
    ) -> anyhow::Result<Transaction> {
        let caller = self.caller(token).await?;
        let transaction = self
            .ledger
            .approve_payment_request(request, caller.id)
            .await?;
        self.notifier.send(NotifyEvent::PaymentRequestApproved {
            request,
            actor: caller.id,
        });
        Ok(transaction)
    }

    pub async fn reject_request(&self, token: &str, request: RequestId) -> anyhow::Result<()> {
        let caller = self.caller(token).await?;
        self.ledger.reject_payment_request(request, caller.id).await?;
        self.notifier.send(NotifyEvent::PaymentRequestRejected {
            request,
            actor: caller.id,
        });
        Ok(())
    }

    pub async fn cancel_request(&self, token: &str, request: RequestId) -> anyhow::Result<()> {
        let caller = self.caller(token).await?;
        self.ledger.cancel_payment_request(request, caller.id).await?;
        Ok(())
    }

    /// Admin-only signed balance adjustment against a username or account
    /// number.
    pub async fn adjust(
        &self,
        admin_key: &str,
        target: &str,
        delta: Decimal,
        description: &str,
    ) -> anyhow::Result<Transaction> {
        self.require_admin(admin_key)?;
        let account = self
            .accounts
            .resolve(target)
            .await?
            .context("target account not found")?;
        let transaction = self.ledger.admin_adjust(account.id, delta, description).await?;
        self.notifier
            .send(NotifyEvent::AdminTransaction(transaction.clone()));
        Ok(transaction)
    }

    /// Admin-only listing of every account.
    pub async fn users(&self, admin_key: &str) -> anyhow::Result<Vec<Account>> {
        self.require_admin(admin_key)?;
        Ok(self.accounts.all().await?)
    }

    pub async fn card(&self, token: &str) -> anyhow::Result<Card> {
        let caller = self.caller(token).await?;
        Ok(self.cards.current_card(&caller).await?)
    }

    pub async fn refresh_card(&self, token: &str) -> anyhow::Result<Card> {
        let caller = self.caller(token).await?;
        let card = self.cards.refresh(&caller).await?;
        self.notifier.send(NotifyEvent::CardRefreshed {
            account: caller.id,
            username: caller.username.clone(),
            card_number: card.card_number.clone(),
        });
        Ok(card)
    }

    fn require_admin(&self, presented: &str) -> anyhow::Result<()> {
        match self.admin_key.as_deref() {
            Some(key) if constant_time_eq(key.as_bytes(), presented.as_bytes()) => Ok(()),
            Some(_) => bail!("invalid admin key"),
            None => bail!("no admin key configured"),
        }
    }
}
