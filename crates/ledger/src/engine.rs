//! Ledger engine - atomic balance mutations
//!
//! Every operation here follows the same shape: open one store transaction,
//! read the parties, validate, write balances plus a transaction row, re-pin
//! the reserve if it took part, commit. An error anywhere before the commit
//! drops the transaction and therefore all of its writes.

use crate::error::LedgerError;
use crate::request::{request_from_row, PaymentRequest, RequestStatus, SELECT_REQUEST};
use crate::transaction::{
    transaction_from_row, Transaction, TransactionKind, SELECT_TRANSACTION,
};
use chrono::Utc;
use minibank_core::{AccountId, Amount, RequestId, TransactionId};
use minibank_store::db::{format_timestamp, parse_decimal, Db};
use rust_decimal::Decimal;
use sqlx::{Row, Sqlite};

/// Username of the distinguished reserve account. Unregistrable; the
/// account representing the bank itself.
pub const RESERVE_USERNAME: &str = "MiniBank";

/// Sentinel the reserve balance is pinned to after every mutation that
/// touches it. The reserve must appear inexhaustible in either direction.
pub fn reserve_balance() -> Amount {
    Amount::new_unchecked(Decimal::new(99_999_999_999, 2))
}

/// Fixed credit granted to every newly created account.
pub fn onboarding_credit() -> Amount {
    Amount::new_unchecked(Decimal::new(100_000, 2))
}

/// A party row read inside a mutation unit.
struct Party {
    id: AccountId,
    username: String,
    balance: Decimal,
}

impl Party {
    fn is_reserve(&self) -> bool {
        self.username == RESERVE_USERNAME
    }
}

/// Executes transfers, the payment-request lifecycle and admin adjustments
/// as atomic units against the store.
#[derive(Clone)]
pub struct LedgerEngine {
    db: Db,
}

impl LedgerEngine {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Move `amount` from `source` to the account identified by
    /// `destination` (username or account number).
    ///
    /// Returns the persisted transaction with both display names resolved.
    pub async fn transfer(
        &self,
        source: AccountId,
        destination: &str,
        amount: Amount,
        description: &str,
    ) -> Result<Transaction, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }

        let mut unit = self.db.pool().begin().await?;

        let src = party_by_id(&mut unit, source)
            .await?
            .ok_or(LedgerError::NotFound)?;
        if src.balance < amount.value() {
            return Err(LedgerError::InsufficientFunds);
        }

        let dst = party_by_identifier(&mut unit, destination)
            .await?
            .ok_or(LedgerError::RecipientNotFound)?;
        if dst.id == src.id {
            return Err(LedgerError::SelfTransfer);
        }

        set_balance(&mut unit, src.id, src.balance - amount.value()).await?;
        set_balance(&mut unit, dst.id, dst.balance + amount.value()).await?;

        let id = insert_transaction(
            &mut unit,
            src.id,
            dst.id,
            amount.value(),
            TransactionKind::Transfer,
            description,
        )
        .await?;

        repin_reserve(&mut unit, [&src, &dst]).await?;
        unit.commit().await?;

        tracing::debug!(%src.id, %dst.id, %amount, "transfer committed");
        self.transaction_by_id(TransactionId(id)).await
    }

    /// Create a `pending` request asking `target` to pay `amount` to
    /// `requester`. Moves no money.
    pub async fn create_payment_request(
        &self,
        requester: AccountId,
        target: &str,
        amount: Amount,
        reason: &str,
        message: &str,
    ) -> Result<PaymentRequest, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }

        let mut unit = self.db.pool().begin().await?;

        let target = party_by_identifier(&mut unit, target)
            .await?
            .ok_or(LedgerError::RecipientNotFound)?;
        if target.id == requester {
            return Err(LedgerError::SelfTransfer);
        }

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO payment_requests (from_account, to_account, amount, reason, message, status, created_at)
            VALUES (?, ?, ?, ?, ?, 'pending', ?)
            RETURNING id
            "#,
        )
        .bind(requester.get())
        .bind(target.id.get())
        .bind(amount.value().to_string())
        .bind(reason)
        .bind(message)
        .bind(format_timestamp(Utc::now()))
        .fetch_one(&mut *unit)
        .await?;

        unit.commit().await?;
        self.request_by_id(RequestId(id)).await
    }

    /// Approve a `pending` request as its target: pay the requester and
    /// mark the request `approved`, all in one unit. If the transfer fails
    /// for any reason the request stays `pending`.
    pub async fn approve_payment_request(
        &self,
        request_id: RequestId,
        approver: AccountId,
    ) -> Result<Transaction, LedgerError> {
        let mut unit = self.db.pool().begin().await?;

        let row = sqlx::query(
            r#"
            SELECT id, from_account, amount, reason FROM payment_requests
            WHERE id = ? AND to_account = ? AND status = 'pending'
            "#,
        )
        .bind(request_id.get())
        .bind(approver.get())
        .fetch_optional(&mut *unit)
        .await?
        .ok_or(LedgerError::AlreadyProcessed)?;

        let requester = AccountId(row.try_get("from_account")?);
        let amount_raw: String = row.try_get("amount")?;
        let amount = parse_decimal("amount", &amount_raw)?;
        let reason: String = row.try_get("reason")?;

        let payer = party_by_id(&mut unit, approver)
            .await?
            .ok_or(LedgerError::NotFound)?;
        if payer.balance < amount {
            return Err(LedgerError::InsufficientFunds);
        }
        let payee = party_by_id(&mut unit, requester)
            .await?
            .ok_or(LedgerError::RecipientNotFound)?;

        set_balance(&mut unit, payer.id, payer.balance - amount).await?;
        set_balance(&mut unit, payee.id, payee.balance + amount).await?;

        let tx_id = insert_transaction(
            &mut unit,
            payer.id,
            payee.id,
            amount,
            TransactionKind::Transfer,
            &format!("Payment for: {reason}"),
        )
        .await?;

        // Conditional transition; a concurrent winner leaves zero rows here
        // and rolls this unit back.
        let updated = sqlx::query(
            "UPDATE payment_requests SET status = 'approved' WHERE id = ? AND status = 'pending'",
        )
        .bind(request_id.get())
        .execute(&mut *unit)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(LedgerError::AlreadyProcessed);
        }

        repin_reserve(&mut unit, [&payer, &payee]).await?;
        unit.commit().await?;

        self.transaction_by_id(TransactionId(tx_id)).await
    }

    /// Reject a `pending` request as its target.
    pub async fn reject_payment_request(
        &self,
        request_id: RequestId,
        actor: AccountId,
    ) -> Result<(), LedgerError> {
        self.transition_request(request_id, actor, "to_account", RequestStatus::Rejected)
            .await
    }

    /// Cancel a `pending` request as its requester.
    pub async fn cancel_payment_request(
        &self,
        request_id: RequestId,
        actor: AccountId,
    ) -> Result<(), LedgerError> {
        self.transition_request(request_id, actor, "from_account", RequestStatus::Cancelled)
            .await
    }

    /// Single conditional update; zero affected rows means the request is
    /// gone, terminal, or owned by someone else. The conditional write is
    /// the only race guard.
    async fn transition_request(
        &self,
        request_id: RequestId,
        actor: AccountId,
        actor_column: &str,
        to: RequestStatus,
    ) -> Result<(), LedgerError> {
        let sql = format!(
            "UPDATE payment_requests SET status = ? WHERE id = ? AND {actor_column} = ? AND status = 'pending'"
        );
        let result = sqlx::query(&sql)
            .bind(to.to_string())
            .bind(request_id.get())
            .bind(actor.get())
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::AlreadyProcessed);
        }
        Ok(())
    }

    /// Apply a signed delta to `target` without a counterpart initiating.
    /// The reserve appears as counterparty of every adjustment: source of
    /// credits, destination of debits.
    pub async fn admin_adjust(
        &self,
        target: AccountId,
        delta: Decimal,
        description: &str,
    ) -> Result<Transaction, LedgerError> {
        if delta.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }
        // Validates magnitude and precision in one place.
        Amount::new(delta.abs()).map_err(|_| LedgerError::InvalidAmount)?;

        let mut unit = self.db.pool().begin().await?;

        let reserve = party_by_username(&mut unit, RESERVE_USERNAME)
            .await?
            .ok_or(LedgerError::ReserveMissing)?;
        let subject = party_by_id(&mut unit, target)
            .await?
            .ok_or(LedgerError::NotFound)?;

        if delta < Decimal::ZERO && subject.balance + delta < Decimal::ZERO {
            return Err(LedgerError::InsufficientFunds);
        }

        set_balance(&mut unit, subject.id, subject.balance + delta).await?;

        let (from, to) = if delta > Decimal::ZERO {
            (reserve.id, subject.id)
        } else {
            (subject.id, reserve.id)
        };

        let id = insert_transaction(
            &mut unit,
            from,
            to,
            delta,
            TransactionKind::AdminAdjustment,
            description,
        )
        .await?;

        repin_reserve(&mut unit, [&reserve, &subject]).await?;
        unit.commit().await?;

        self.transaction_by_id(TransactionId(id)).await
    }

    /// Grant the fixed onboarding credit to a freshly created account,
    /// logged as a `deposit` from the reserve.
    pub async fn grant_onboarding_credit(
        &self,
        account: AccountId,
    ) -> Result<Transaction, LedgerError> {
        let credit = onboarding_credit();
        let mut unit = self.db.pool().begin().await?;

        let reserve = party_by_username(&mut unit, RESERVE_USERNAME)
            .await?
            .ok_or(LedgerError::ReserveMissing)?;
        let subject = party_by_id(&mut unit, account)
            .await?
            .ok_or(LedgerError::NotFound)?;

        set_balance(&mut unit, subject.id, subject.balance + credit.value()).await?;

        let id = insert_transaction(
            &mut unit,
            reserve.id,
            subject.id,
            credit.value(),
            TransactionKind::Deposit,
            "Onboarding credit",
        )
        .await?;

        repin_reserve(&mut unit, [&reserve, &subject]).await?;
        unit.commit().await?;

        self.transaction_by_id(TransactionId(id)).await
    }

    /// Force the reserve balance back to the sentinel. Idempotent; called
    /// at startup to compensate for out-of-band writes. Returns whether the
    /// reserve account exists.
    pub async fn ensure_reserve_invariant(&self) -> Result<bool, LedgerError> {
        let result = sqlx::query("UPDATE accounts SET balance = ? WHERE username = ?")
            .bind(reserve_balance().value().to_string())
            .bind(RESERVE_USERNAME)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Current balance of an account.
    pub async fn balance(&self, account: AccountId) -> Result<Amount, LedgerError> {
        let raw: Option<String> = sqlx::query_scalar("SELECT balance FROM accounts WHERE id = ?")
            .bind(account.get())
            .fetch_optional(self.db.pool())
            .await?;
        let raw = raw.ok_or(LedgerError::NotFound)?;
        Ok(Amount::new_unchecked(parse_decimal("balance", &raw)?))
    }

    /// Transaction history as seen from `viewer`: newest first (created_at
    /// then id descending), amounts negated on rows where the viewer is the
    /// source.
    pub async fn transactions_for(
        &self,
        viewer: AccountId,
        limit: i64,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let sql = format!(
            "{SELECT_TRANSACTION} WHERE t.from_account = ? OR t.to_account = ? \
             ORDER BY t.created_at DESC, t.id DESC LIMIT ?"
        );
        let rows = sqlx::query(&sql)
            .bind(viewer.get())
            .bind(viewer.get())
            .bind(limit)
            .fetch_all(self.db.pool())
            .await?;

        let mut transactions = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut transaction = transaction_from_row(row)?;
            if transaction.from_account == viewer {
                transaction.amount = -transaction.amount;
            }
            transactions.push(transaction);
        }
        Ok(transactions)
    }

    /// Payment requests involving `account`: (incoming, outgoing),
    /// newest first.
    pub async fn requests_for(
        &self,
        account: AccountId,
    ) -> Result<(Vec<PaymentRequest>, Vec<PaymentRequest>), LedgerError> {
        let incoming_sql =
            format!("{SELECT_REQUEST} WHERE pr.to_account = ? ORDER BY pr.created_at DESC");
        let outgoing_sql =
            format!("{SELECT_REQUEST} WHERE pr.from_account = ? ORDER BY pr.created_at DESC");

        let incoming = sqlx::query(&incoming_sql)
            .bind(account.get())
            .fetch_all(self.db.pool())
            .await?;
        let outgoing = sqlx::query(&outgoing_sql)
            .bind(account.get())
            .fetch_all(self.db.pool())
            .await?;

        Ok((
            incoming
                .iter()
                .map(request_from_row)
                .collect::<Result<_, _>>()?,
            outgoing
                .iter()
                .map(request_from_row)
                .collect::<Result<_, _>>()?,
        ))
    }

    /// Fetch one transaction with display names.
    pub async fn transaction_by_id(
        &self,
        id: TransactionId,
    ) -> Result<Transaction, LedgerError> {
        let sql = format!("{SELECT_TRANSACTION} WHERE t.id = ?");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(self.db.pool())
            .await?
            .ok_or(LedgerError::NotFound)?;
        Ok(transaction_from_row(&row)?)
    }

    /// Fetch one payment request with display names.
    pub async fn request_by_id(&self, id: RequestId) -> Result<PaymentRequest, LedgerError> {
        let sql = format!("{SELECT_REQUEST} WHERE pr.id = ?");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(self.db.pool())
            .await?
            .ok_or(LedgerError::NotFound)?;
        Ok(request_from_row(&row)?)
    }
}

async fn party_by_id(
    unit: &mut sqlx::Transaction<'_, Sqlite>,
    id: AccountId,
) -> Result<Option<Party>, LedgerError> {
    let row = sqlx::query("SELECT id, username, balance FROM accounts WHERE id = ?")
        .bind(id.get())
        .fetch_optional(&mut **unit)
        .await?;
    row.map(|row| party_from_row(&row)).transpose()
}

async fn party_by_username(
    unit: &mut sqlx::Transaction<'_, Sqlite>,
    username: &str,
) -> Result<Option<Party>, LedgerError> {
    let row = sqlx::query("SELECT id, username, balance FROM accounts WHERE username = ?")
        .bind(username)
        .fetch_optional(&mut **unit)
        .await?;
    row.map(|row| party_from_row(&row)).transpose()
}

/// Resolve a username or an account number, username taking precedence.
async fn party_by_identifier(
    unit: &mut sqlx::Transaction<'_, Sqlite>,
    identifier: &str,
) -> Result<Option<Party>, LedgerError> {
    if let Some(party) = party_by_username(unit, identifier).await? {
        return Ok(Some(party));
    }
    let row = sqlx::query("SELECT id, username, balance FROM accounts WHERE account_number = ?")
        .bind(identifier)
        .fetch_optional(&mut **unit)
        .await?;
    row.map(|row| party_from_row(&row)).transpose()
}

fn party_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Party, LedgerError> {
    let balance_raw: String = row.try_get("balance")?;
    Ok(Party {
        id: AccountId(row.try_get("id")?),
        username: row.try_get("username")?,
        balance: parse_decimal("balance", &balance_raw)?,
    })
}

async fn set_balance(
    unit: &mut sqlx::Transaction<'_, Sqlite>,
    id: AccountId,
    value: Decimal,
) -> Result<(), LedgerError> {
    sqlx::query("UPDATE accounts SET balance = ? WHERE id = ?")
        .bind(value.to_string())
        .bind(id.get())
        .execute(&mut **unit)
        .await?;
    Ok(())
}

async fn insert_transaction(
    unit: &mut sqlx::Transaction<'_, Sqlite>,
    from: AccountId,
    to: AccountId,
    amount: Decimal,
    kind: TransactionKind,
    description: &str,
) -> Result<i64, LedgerError> {
    let id = sqlx::query_scalar(
        r#"
        INSERT INTO transactions (from_account, to_account, amount, kind, description, status, created_at)
        VALUES (?, ?, ?, ?, ?, 'completed', ?)
        RETURNING id
        "#,
    )
    .bind(from.get())
    .bind(to.get())
    .bind(amount.to_string())
    .bind(kind.to_string())
    .bind(description)
    .bind(format_timestamp(Utc::now()))
    .fetch_one(&mut **unit)
    .await?;
    Ok(id)
}

/// Re-pin the reserve balance to the sentinel for any listed party that is
/// the reserve account. Runs inside the same unit as the mutation.
async fn repin_reserve(
    unit: &mut sqlx::Transaction<'_, Sqlite>,
    parties: [&Party; 2],
) -> Result<(), LedgerError> {
    for party in parties {
        if party.is_reserve() {
            set_balance(unit, party.id, reserve_balance().value()).await?;
            tracing::debug!(%party.id, "reserve balance re-pinned");
        }
    }
    Ok(())
}
