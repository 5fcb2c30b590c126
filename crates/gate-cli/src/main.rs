//! gatekeep
//!
//! Office-supply agent whose purchases wait for a human decision.

use anyhow::Context;
use clap::Parser;
use gate_approval::CancellationToken;
use gate_core::{init_logging, ConfigSource};

mod cli;
mod demo;
mod settings;

use cli::{Cli, Commands};

/// Token cancelled on Ctrl-C
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, abandoning pending approvals");
            trigger.cancel();
        }
    });
    token
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();

    let (config, source) = settings::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    init_logging(&config.app.logging);
    if source == ConfigSource::Defaults {
        tracing::warn!("{} not found, using built-in defaults", args.config.display());
    }

    let cancel = shutdown_token();

    match args.command {
        Commands::Agent { prompt } => demo::run_prompt(&config, &prompt, &cancel).await,
        Commands::Scenario { kind } => demo::run_scenario(&config, kind, &cancel).await,
        Commands::Reel => demo::run_reel(&config, &cancel).await,
        Commands::Policy => demo::show_policy(&config),
    }
}
