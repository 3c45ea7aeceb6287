//! Notifier - detached dispatch over a pluggable sink

use crate::event::NotifyEvent;
use crate::NotifyError;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Destination for event envelopes. The production implementation is
/// [`crate::WebhookSink`]; tests substitute a recorder.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn deliver(&self, envelope: crate::Envelope) -> Result<(), NotifyError>;
}

/// Dispatches events to the configured sink on detached tasks.
///
/// `send` never blocks and never fails: delivery errors are logged at
/// `warn` and discarded, and with no sink configured events are dropped.
#[derive(Clone)]
pub struct Notifier {
    sink: Option<Arc<dyn EventSink>>,
    in_flight: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Notifier {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            sink: Some(sink),
            in_flight: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A notifier that drops everything; used when no webhook URL is set.
    pub fn disabled() -> Self {
        Self {
            sink: None,
            in_flight: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fire an event. Returns immediately; the delivery happens on its own
    /// task, strictly detached from whatever mutation produced the event.
    pub fn send(&self, event: NotifyEvent) {
        let Some(sink) = self.sink.clone() else {
            tracing::trace!(event = event.name(), "no sink configured; event dropped");
            return;
        };

        let name = event.name();
        let envelope = event.into_envelope();
        let handle = tokio::spawn(async move {
            if let Err(err) = sink.deliver(envelope).await {
                tracing::warn!(event = name, error = %err, "event delivery failed");
            }
        });

        if let Ok(mut in_flight) = self.in_flight.lock() {
            in_flight.retain(|h| !h.is_finished());
            in_flight.push(handle);
        }
    }

    /// Wait for outstanding deliveries. Only used at process shutdown so a
    /// short-lived CLI does not exit under its own webhooks.
    pub async fn drain(&self) {
        let handles = match self.in_flight.lock() {
            Ok(mut in_flight) => std::mem::take(&mut *in_flight),
            Err(_) => return,
        };
        for handle in handles {
            let _ = handle.await;
        }
    }
}
