//! Notifier configuration
//!
//! Read from `~/.config/deploy-notify/config.json` when present. Every field
//! has a default, so a missing file or a partial one is fine.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::notification::secret::{EnvSecretResolver, FileSecretResolver, SecretResolver, ENV_SLACK_WEBHOOK_URL};
use crate::notification::synth::deployment::{DeploymentStateSynthesizer, DEFAULT_OFFSET_HOURS};
use crate::notification::webhook::{WebhookClient, WebhookConfig, DEFAULT_TIMEOUT_SECS};
use crate::notification::{EventHandler, EventRouter, Synthesizers};

/// Config file location relative to the home directory
pub const CONFIG_RELATIVE_PATH: &str = ".config/deploy-notify/config.json";

/// Environment variable that switches extended routes on or off
pub const ENV_EXTENDED_ROUTES: &str = "DEPLOY_NOTIFY_EXTENDED_ROUTES";

/// Where the webhook endpoint comes from and how it is called
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookSettings {
    /// Environment variable holding the URL
    pub url_env: String,
    /// File holding the URL; wins over `url_env` when set
    pub url_file: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            url_env: ENV_SLACK_WEBHOOK_URL.to_string(),
            url_file: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub webhook: WebhookSettings,
    /// Offset applied to event times in deployment messages
    pub display_offset_hours: i32,
    /// Route task state changes and service actions too
    pub extended_routes: bool,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            webhook: WebhookSettings::default(),
            display_offset_hours: DEFAULT_OFFSET_HOURS,
            extended_routes: false,
        }
    }
}

impl NotifierConfig {
    /// Default config file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_RELATIVE_PATH))
    }

    /// Load from the default location, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };
        config.apply_extended_routes_override(std::env::var(ENV_EXTENDED_ROUTES).ok().as_deref());
        Ok(config)
    }

    /// Load from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    fn apply_extended_routes_override(&mut self, value: Option<&str>) {
        let Some(value) = value else { return };
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => self.extended_routes = true,
            "0" | "false" | "no" | "off" => self.extended_routes = false,
            other => warn!(var = ENV_EXTENDED_ROUTES, value = other, "Ignoring unrecognized override"),
        }
    }

    pub fn router(&self) -> EventRouter {
        EventRouter::new().with_extended_routes(self.extended_routes)
    }

    pub fn synthesizers(&self) -> Synthesizers {
        Synthesizers::default()
            .with_deployment(DeploymentStateSynthesizer::with_offset_hours(self.display_offset_hours))
    }

    pub fn resolver(&self) -> Arc<dyn SecretResolver> {
        match &self.webhook.url_file {
            Some(path) => Arc::new(FileSecretResolver::new(path)),
            None => Arc::new(EnvSecretResolver::new(&self.webhook.url_env)),
        }
    }

    pub fn webhook_config(&self) -> WebhookConfig {
        WebhookConfig {
            timeout_secs: self.webhook.timeout_secs,
        }
    }

    /// Handler backed by the Slack webhook client
    pub fn build_handler(&self) -> Result<EventHandler> {
        let client = WebhookClient::new(self.webhook_config()).context("Failed to build webhook client")?;
        Ok(EventHandler::new(self.resolver(), Arc::new(client))
            .with_router(self.router())
            .with_synthesizers(self.synthesizers()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = NotifierConfig::default();
        assert_eq!(config.webhook.url_env, "SLACK_WEBHOOK_URL");
        assert_eq!(config.webhook.timeout_secs, 10);
        assert_eq!(config.display_offset_hours, 9);
        assert!(!config.extended_routes);
        if let Some(path) = NotifierConfig::default_path() {
            assert!(path.ends_with("deploy-notify/config.json"));
        }
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "webhook": {{ "timeout_secs": 3 }}, "extended_routes": true }}"#).unwrap();

        let config = NotifierConfig::load_from(file.path()).unwrap();
        assert_eq!(config.webhook.timeout_secs, 3);
        assert_eq!(config.webhook.url_env, "SLACK_WEBHOOK_URL");
        assert_eq!(config.display_offset_hours, 9);
        assert!(config.extended_routes);
        assert_eq!(config.webhook_config().timeout_secs, 3);
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = NotifierConfig::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));

        let dir = tempfile::tempdir().unwrap();
        assert!(NotifierConfig::load_from(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_extended_routes_override() {
        let mut config = NotifierConfig::default();
        config.apply_extended_routes_override(Some("TRUE"));
        assert!(config.extended_routes);
        config.apply_extended_routes_override(Some("maybe"));
        assert!(config.extended_routes);
        config.apply_extended_routes_override(Some("0"));
        assert!(!config.extended_routes);
        config.apply_extended_routes_override(None);
        assert!(!config.extended_routes);
    }

    #[tokio::test]
    async fn test_file_resolver_wins() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "https://hooks.example.com/configured").unwrap();

        let config = NotifierConfig {
            webhook: WebhookSettings {
                url_env: "DEPLOY_NOTIFY_TEST_NEVER_SET".to_string(),
                url_file: Some(file.path().to_path_buf()),
                ..Default::default()
            },
            ..Default::default()
        };
        let endpoint = config.resolver().resolve_webhook_endpoint().await.unwrap();
        assert_eq!(endpoint.expose(), "https://hooks.example.com/configured");
        assert!(config.build_handler().is_ok());
    }
}
