//! Event input for CLI commands

use anyhow::{Context, Result};
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Read one raw event from a file, or from stdin when no file is given
pub async fn read_event(path: Option<&Path>) -> Result<serde_json::Value> {
    let (content, origin) = match path {
        Some(path) => {
            let content = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read event file {}", path.display()))?;
            (content, path.display().to_string())
        }
        None => {
            let mut content = String::new();
            tokio::io::stdin()
                .read_to_string(&mut content)
                .await
                .context("Failed to read event from stdin")?;
            (content, "stdin".to_string())
        }
    };

    serde_json::from_str(&content).with_context(|| format!("Event from {origin} is not valid JSON"))
}
