//! `handle` command: process one event end to end

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use super::input::read_event;
use super::output::format_output;
use crate::config::NotifierConfig;
use crate::notification::InvocationOutcome;

/// handle command arguments
#[derive(Args, Debug)]
pub struct HandleArgs {
    /// Event JSON file (reads stdin when omitted)
    #[arg(long)]
    pub event: Option<PathBuf>,

    /// Render the Slack payload without resolving the webhook or sending
    #[arg(long)]
    pub dry_run: bool,

    /// Config file (default: ~/.config/deploy-notify/config.json)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Pretty-print the outcome
    #[arg(long)]
    pub pretty: bool,
}

pub(crate) fn load_config(path: Option<&PathBuf>) -> Result<NotifierConfig> {
    match path {
        Some(path) => NotifierConfig::load_from(path),
        None => NotifierConfig::load(),
    }
}

/// Handle one event and print the outcome to stdout
pub async fn handle_event(args: HandleArgs) -> Result<InvocationOutcome> {
    let config = load_config(args.config.as_ref())?;
    let event = read_event(args.event.as_deref()).await?;

    let handler = config.build_handler()?.with_dry_run(args.dry_run);
    let outcome = handler.handle(event).await;

    info!(status_code = outcome.status_code, dry_run = args.dry_run, "Invocation finished");
    println!("{}", format_output(&outcome, args.pretty));
    Ok(outcome)
}
