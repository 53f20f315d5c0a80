//! deploy-notify CLI
//!
//! Turns container deployment and load-balancer health events into Slack
//! notifications.

use anyhow::Result;
use clap::{Parser, Subcommand};
use deploy_notify::cli::{handle_classify, handle_event, ClassifyArgs, HandleArgs};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "deploy-notify")]
#[command(about = "Classify deployment and target health events and post them to Slack")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one event: classify, build the message and deliver it
    Handle(HandleArgs),
    /// Show how an event would be routed, without sending anything
    Classify(ClassifyArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the invocation outcome.
    // Level via RUST_LOG, e.g. RUST_LOG=deploy_notify=debug
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("deploy_notify=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Handle(args) => {
            let outcome = handle_event(args).await?;
            if !outcome.is_success() {
                std::process::exit(1);
            }
        }
        Commands::Classify(args) => {
            handle_classify(args).await?;
        }
    }

    Ok(())
}
