//! Slack incoming-webhook transport
//!
//! One POST per message, bounded by a timeout. No retries: a failed attempt
//! is reported to the caller and the invocation ends there.

use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, warn};

use super::message::{NotificationMessage, SlackPayload};
use crate::error::DeliveryError;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Webhook endpoint address. Treated as a secret: `Debug` and `Display`
/// never show the path.
#[derive(Clone, PartialEq, Eq)]
pub struct WebhookEndpoint(String);

impl WebhookEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// The full address; only for making the request
    pub fn expose(&self) -> &str {
        &self.0
    }

    fn redacted(&self) -> String {
        match Url::parse(&self.0) {
            Ok(url) => match url.host_str() {
                Some(host) => format!("{}://{}/***", url.scheme(), host),
                None => format!("{}:***", url.scheme()),
            },
            Err(_) => "***".to_string(),
        }
    }
}

impl std::fmt::Debug for WebhookEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("WebhookEndpoint").field(&self.redacted()).finish()
    }
}

impl std::fmt::Display for WebhookEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.redacted())
    }
}

/// Successful delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryAck {
    pub status: u16,
}

/// Sends a finished notification somewhere
#[async_trait]
pub trait DeliveryTransport: Send + Sync {
    /// Transport name (for logs)
    fn name(&self) -> &str;

    async fn deliver(
        &self,
        endpoint: &WebhookEndpoint,
        message: &NotificationMessage,
    ) -> Result<DeliveryAck, DeliveryError>;
}

/// Webhook client configuration
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Slack webhook client
#[derive(Debug)]
pub struct WebhookClient {
    client: Client,
    config: WebhookConfig,
}

impl WebhookClient {
    pub fn new(config: WebhookConfig) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DeliveryError::Client(e.without_url()))?;

        Ok(Self { client, config })
    }

    /// reqwest errors carry the request URL, which is the secret
    fn classify_error(&self, error: reqwest::Error) -> DeliveryError {
        if error.is_timeout() {
            DeliveryError::Timeout(self.config.timeout_secs)
        } else {
            DeliveryError::Transport(error.without_url())
        }
    }
}

#[async_trait]
impl DeliveryTransport for WebhookClient {
    fn name(&self) -> &str {
        "slack"
    }

    async fn deliver(
        &self,
        endpoint: &WebhookEndpoint,
        message: &NotificationMessage,
    ) -> Result<DeliveryAck, DeliveryError> {
        let payload = SlackPayload::from(message);

        debug!(channel = "slack", endpoint = %endpoint, title = message.title(), "Sending notification");

        let response = self
            .client
            .post(endpoint.expose())
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.classify_error(e))?;

        let status = response.status();
        if status.is_success() {
            debug!(channel = "slack", status = %status, "Notification sent successfully");
            return Ok(DeliveryAck {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.unwrap_or_default();
        warn!(
            channel = "slack",
            status = %status,
            body = %body,
            "Slack webhook request failed"
        );
        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
