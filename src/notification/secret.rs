//! Webhook endpoint lookup
//!
//! The endpoint is resolved once per invocation through a [`SecretResolver`]
//! so the rest of the pipeline never touches the backing store. A failed
//! lookup ends the invocation.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use super::webhook::WebhookEndpoint;
use crate::error::SecretError;

/// Default environment variable holding the webhook URL
pub const ENV_SLACK_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";

#[async_trait]
pub trait SecretResolver: Send + Sync {
    async fn resolve_webhook_endpoint(&self) -> Result<WebhookEndpoint, SecretError>;
}

/// Reads the endpoint from an environment variable
#[derive(Debug, Clone)]
pub struct EnvSecretResolver {
    var: String,
}

impl EnvSecretResolver {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvSecretResolver {
    fn default() -> Self {
        Self::new(ENV_SLACK_WEBHOOK_URL)
    }
}

#[async_trait]
impl SecretResolver for EnvSecretResolver {
    async fn resolve_webhook_endpoint(&self) -> Result<WebhookEndpoint, SecretError> {
        let value = std::env::var(&self.var).map_err(|_| SecretError::NotFound(self.var.clone()))?;
        let value = value.trim();
        if value.is_empty() {
            return Err(SecretError::Empty(self.var.clone()));
        }
        debug!(var = %self.var, "Resolved webhook endpoint from environment");
        Ok(WebhookEndpoint::new(value))
    }
}

/// Reads the endpoint from a file (first non-empty line)
#[derive(Debug, Clone)]
pub struct FileSecretResolver {
    path: PathBuf,
}

impl FileSecretResolver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SecretResolver for FileSecretResolver {
    async fn resolve_webhook_endpoint(&self) -> Result<WebhookEndpoint, SecretError> {
        let location = self.path.display().to_string();
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SecretError::NotFound(location));
            }
            Err(source) => return Err(SecretError::Unreadable { location, source }),
        };

        let url = content
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| SecretError::Empty(location.clone()))?;

        debug!(path = %location, "Resolved webhook endpoint from file");
        Ok(WebhookEndpoint::new(url))
    }
}

/// Fixed endpoint, mostly for tests and local runs
#[derive(Debug, Clone)]
pub struct StaticSecretResolver {
    endpoint: WebhookEndpoint,
}

impl StaticSecretResolver {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            endpoint: WebhookEndpoint::new(url),
        }
    }
}

#[async_trait]
impl SecretResolver for StaticSecretResolver {
    async fn resolve_webhook_endpoint(&self) -> Result<WebhookEndpoint, SecretError> {
        Ok(self.endpoint.clone())
    }
}
