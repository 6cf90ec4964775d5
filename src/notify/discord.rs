use std::time::Duration;

use reqwest::Client;

use crate::error::{DeliveryError, WebhookError};
use crate::notify::WebhookPayload;
use crate::retry::RetryPolicy;

/// Posts rendered payloads to a Discord-compatible webhook.
#[derive(Clone)]
pub struct DiscordNotifier {
    webhook: String,
    client: Client,
    timeout: Duration,
    retry: RetryPolicy,
}

impl DiscordNotifier {
    pub fn new(webhook: impl Into<String>) -> Self {
        Self {
            webhook: webhook.into(),
            client: Client::new(),
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Deliver one payload. Transient failures (network, 5xx, rate limit)
    /// are retried with backoff; any other rejection fails immediately.
    pub async fn deliver(&self, payload: &WebhookPayload) -> Result<(), DeliveryError> {
        self.retry
            .run("webhook delivery", WebhookError::is_transient, || {
                self.post_once(payload)
            })
            .await
            .map_err(DeliveryError::from)
    }

    async fn post_once(&self, payload: &WebhookPayload) -> Result<(), WebhookError> {
        let response = self
            .client
            .post(&self.webhook)
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(status = %status, "webhook accepted payload");
            return Ok(());
        }

        // Keep the response text: it names the offending field when Discord
        // rejects a payload.
        let body = response.text().await.unwrap_or_default();
        Err(WebhookError::Rejected { status, body })
    }
}
