//! Webhook sink - POSTs envelopes to a configured URL

use crate::notifier::EventSink;
use crate::{Envelope, NotifyError};
use async_trait::async_trait;
use std::time::Duration;

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// POSTs each envelope as JSON to one fixed URL.
///
/// The URL is supplied at construction; the sink performs no environment
/// lookups of its own.
pub struct WebhookSink {
    url: String,
    client: reqwest::Client,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .user_agent("minibank-webhook/1.0")
            .build()
            .unwrap_or_default();
        Self {
            url: url.into(),
            client,
        }
    }
}

#[async_trait]
impl EventSink for WebhookSink {
    async fn deliver(&self, envelope: Envelope) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(&envelope)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }
        Ok(())
    }
}
