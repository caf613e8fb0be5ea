//! tripsync command-line entry point.
//!
//! Results are printed as JSON on stdout. Logging goes to stderr so output
//! stays machine-readable.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;
use tripsync_client::SyncSession;
use tripsync_core::SyncConfig;

mod args;

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = SyncConfig::load().context("failed to load configuration")?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    let session = SyncSession::open(&config).await.context("failed to open sync session")?;
    run(&session, cli.command).await
}

async fn run(session: &SyncSession, command: Commands) -> Result<ExitCode> {
    let (output, found) = match command {
        Commands::Get { id, force } => match session.get_itinerary(&id, force).await {
            Some(result) => (serde_json::to_value(result)?, true),
            None => (Value::Null, false),
        },
        Commands::Patch { id, path, value } => {
            let updated = session.update_cached_itinerary_part(&id, &path, parse_value(&value)).await;
            (json!({ "updated": updated }), updated)
        }
        Commands::List => (json!(session.cache().list().await), true),
        Commands::Remove { id } => {
            let removed = session.cache().remove(&id).await;
            (json!({ "removed": removed }), removed)
        }
        Commands::Stats => (serde_json::to_value(session.stats().await)?, true),
        Commands::Cleanup => (json!({ "removed": session.cleanup().await }), true),
        Commands::Clear => {
            let cleared = session.cache().clear().await;
            (json!({ "cleared": cleared }), cleared)
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(if found { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Parse a command-line value as JSON, falling back to a plain string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
