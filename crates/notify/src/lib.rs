//! Minibank Notify - outbound event notifications
//!
//! After a ledger mutation commits, a copy of the result is pushed here.
//! Delivery is best-effort and strictly outside the mutation: events are
//! spawned onto detached tasks, failures are logged and dropped, and an
//! unconfigured sink swallows everything silently. Nothing in this crate
//! can make a committed mutation fail.

pub mod event;
pub mod notifier;
pub mod webhook;

pub use event::{Envelope, NotifyEvent};
pub use notifier::{EventSink, Notifier};
pub use webhook::WebhookSink;

use thiserror::Error;

/// Errors from a delivery attempt. Logged, never surfaced to callers.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Webhook returned status {0}")]
    Status(u16),
}
