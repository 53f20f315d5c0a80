//! `classify` command: show how an event would be routed

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use super::handle::load_config;
use super::input::read_event;
use super::output::format_output;
use crate::envelope::Envelope;
use crate::notification::{EventRouter, Route};

/// classify command arguments
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Event JSON file (reads stdin when omitted)
    #[arg(long)]
    pub event: Option<PathBuf>,

    /// Config file (default: ~/.config/deploy-notify/config.json)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Pretty-print the report
    #[arg(long)]
    pub pretty: bool,
}

/// Routing decision for one event
#[derive(Debug, Serialize)]
pub struct ClassifyReport {
    pub source: String,
    pub category: String,
    pub resource: String,
    pub occurred_at: String,
    #[serde(flatten)]
    pub route: Route,
}

impl ClassifyReport {
    pub fn new(envelope: &Envelope, router: &EventRouter) -> Self {
        Self {
            source: envelope.source().to_string(),
            category: envelope.category().to_string(),
            resource: envelope.resource_name(),
            occurred_at: envelope.occurred_at().raw(),
            route: router.classify(envelope),
        }
    }
}

/// Classify one event and print the report to stdout
pub async fn handle_classify(args: ClassifyArgs) -> Result<()> {
    let config = load_config(args.config.as_ref())?;
    let event = read_event(args.event.as_deref()).await?;
    let envelope = Envelope::from_value(event)?;

    let report = ClassifyReport::new(&envelope, &config.router());
    println!("{}", format_output(&report, args.pretty));
    Ok(())
}
