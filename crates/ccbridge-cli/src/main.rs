//! ccbridge - contact-center migration and reconciliation engine.
//!
//! Runs engine operations against a JSON fixture standing in for the source
//! and target platforms, with backups kept in a sled store.

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod config;
mod error;
mod fixture;
mod registry;

use std::path::Path;
use std::sync::Arc;

use ccbridge_core::{CancellationToken, Engine, EngineConfig, SledBackupStore};
use clap::Parser;
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{Args, Command};
use error::{CliError, Result};
use fixture::Fixture;

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries only the JSON result
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ccbridge=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let command = args.command.clone();
    let data_path = args.data_path.clone();
    let config = args.into_config();

    let result = match command {
        Command::Operations => list_operations(),
        Command::Invoke {
            operation,
            input,
            fixture,
        } => invoke(&operation, &input, &fixture, &data_path, config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn list_operations() -> Result<()> {
    let listing: Vec<Value> = registry::OPERATIONS
        .iter()
        .map(registry::OperationSpec::describe)
        .collect();
    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}

async fn invoke(
    operation: &str,
    input: &str,
    fixture_path: &Path,
    data_path: &Path,
    config: EngineConfig,
) -> Result<()> {
    if registry::find(operation).is_none() {
        return Err(CliError::UnknownOperation(operation.to_string()));
    }
    let input = read_input(input)?;

    let mut fixture = Fixture::load(fixture_path)?;
    let target = Arc::new(fixture.target());
    let store = SledBackupStore::open_path(data_path)?;

    tracing::info!(
        operation,
        fixture = %fixture_path.display(),
        data_path = %data_path.display(),
        "invoking operation"
    );

    let engine = Engine::new(
        Arc::new(fixture.source()),
        target.clone(),
        Arc::new(store),
        config,
    );

    // Ctrl+C cancels the running operation; partial results are still printed
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl+c");
            return;
        }
        tracing::warn!("received interrupt, cancelling");
        signal_token.cancel();
    });

    let output = registry::invoke(&engine, operation, input, &cancel).await;

    if target.mutation_count() > 0 {
        fixture.absorb(&target);
        fixture.save(fixture_path)?;
        tracing::debug!(fixture = %fixture_path.display(), "target state written back");
    }

    println!("{}", serde_json::to_string_pretty(&output?)?);
    Ok(())
}

/// Inline JSON, or `@path` to read it from a file.
fn read_input(input: &str) -> Result<Value> {
    let raw = match input.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path).map_err(|e| CliError::file(path, e))?,
        None => input.to_string(),
    };
    Ok(serde_json::from_str(&raw)?)
}
