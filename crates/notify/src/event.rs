//! Event payloads
//!
//! Each event carries the relevant entity's public fields inside a
//! `{id, event, timestamp, data}` envelope. Consumers should treat the
//! payload as informational; there is no ordering or delivery guarantee.

use chrono::{DateTime, Utc};
use minibank_core::{AccountId, RequestId};
use minibank_ledger::{PaymentRequest, Transaction};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

/// A ledger event worth telling the outside world about.
#[derive(Debug, Clone)]
pub enum NotifyEvent {
    TransferCompleted(Transaction),
    PaymentRequestCreated(PaymentRequest),
    PaymentRequestApproved { request: RequestId, actor: AccountId },
    PaymentRequestRejected { request: RequestId, actor: AccountId },
    AdminTransaction(Transaction),
    CardRefreshed {
        account: AccountId,
        username: String,
        card_number: String,
    },
}

impl NotifyEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            NotifyEvent::TransferCompleted(_) => "transfer_completed",
            NotifyEvent::PaymentRequestCreated(_) => "payment_request_created",
            NotifyEvent::PaymentRequestApproved { .. } => "payment_request_approved",
            NotifyEvent::PaymentRequestRejected { .. } => "payment_request_rejected",
            NotifyEvent::AdminTransaction(_) => "admin_transaction",
            NotifyEvent::CardRefreshed { .. } => "card_refreshed",
        }
    }

    fn data(&self) -> serde_json::Value {
        match self {
            NotifyEvent::TransferCompleted(tx) | NotifyEvent::AdminTransaction(tx) => {
                json!({
                    "transactionId": tx.id,
                    "fromAccount": tx.from_account,
                    "fromUsername": tx.from_username,
                    "toAccount": tx.to_account,
                    "toUsername": tx.to_username,
                    "amount": tx.amount,
                    "kind": tx.kind,
                    "description": tx.description,
                    "status": tx.status,
                })
            }
            NotifyEvent::PaymentRequestCreated(request) => json!({
                "requestId": request.id,
                "fromAccount": request.from_account,
                "fromUsername": request.from_username,
                "toAccount": request.to_account,
                "toUsername": request.to_username,
                "amount": request.amount,
                "reason": request.reason,
                "message": request.message,
                "status": request.status,
            }),
            NotifyEvent::PaymentRequestApproved { request, actor } => json!({
                "requestId": request,
                "action": "approve",
                "actorAccount": actor,
            }),
            NotifyEvent::PaymentRequestRejected { request, actor } => json!({
                "requestId": request,
                "action": "reject",
                "actorAccount": actor,
            }),
            NotifyEvent::CardRefreshed {
                account,
                username,
                card_number,
            } => json!({
                "account": account,
                "username": username,
                "cardNumber": card_number,
                "action": "refresh",
            }),
        }
    }

    /// Wrap into the wire envelope, stamped now.
    pub fn into_envelope(self) -> Envelope {
        Envelope {
            id: Uuid::new_v4(),
            event: self.name(),
            timestamp: Utc::now(),
            data: self.data(),
        }
    }
}

/// The JSON document POSTed to the webhook.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub id: Uuid,
    pub event: &'static str,
    pub timestamp: DateTime<Utc>,
    pub data: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use minibank_core::TransactionId;
    use minibank_ledger::{TransactionKind, TransactionStatus};
    use rust_decimal::Decimal;

    fn sample_transaction() -> Transaction {
        Transaction {
            id: TransactionId(7),
            from_account: AccountId(1),
            to_account: AccountId(2),
            amount: Decimal::new(20000, 2),
            kind: TransactionKind::Transfer,
            description: "rent".into(),
            status: TransactionStatus::Completed,
            created_at: Utc::now(),
            from_username: Some("alice".into()),
            to_username: Some("bob".into()),
        }
    }

    #[test]
    fn transfer_envelope_shape() {
        let envelope = NotifyEvent::TransferCompleted(sample_transaction()).into_envelope();
        assert_eq!(envelope.event, "transfer_completed");

        let data = envelope.data;
        assert_eq!(data["transactionId"], 7);
        assert_eq!(data["fromUsername"], "alice");
        assert_eq!(data["toUsername"], "bob");
        assert_eq!(data["amount"], "200.00");
        assert_eq!(data["kind"], "transfer");
        assert_eq!(data["status"], "completed");
    }

    #[test]
    fn event_names_match_wire_protocol() {
        let approved = NotifyEvent::PaymentRequestApproved {
            request: RequestId(3),
            actor: AccountId(1),
        };
        assert_eq!(approved.name(), "payment_request_approved");

        let refreshed = NotifyEvent::CardRefreshed {
            account: AccountId(1),
            username: "alice".into(),
            card_number: "4532015671566062".into(),
        };
        assert_eq!(refreshed.name(), "card_refreshed");
        assert_eq!(refreshed.into_envelope().data["action"], "refresh");
    }
}
