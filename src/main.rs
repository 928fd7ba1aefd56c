//! Reliafleet report server.
//!
//! Loads a maintenance snapshot, wires up the reliability engine, and serves
//! the four report endpoints.
//!
//! # Usage
//!
//! ```bash
//! # Serve reports from a snapshot extract
//! reliafleet --snapshot data/2024-03.json
//!
//! # Override the bind address
//! reliafleet --snapshot data/2024-03.json --addr 127.0.0.1:9100
//! ```
//!
//! # Environment Variables
//!
//! - `RELIAFLEET_SNAPSHOT_PATH`, `RELIAFLEET_LISTEN_ADDR`,
//!   `RELIAFLEET_QUERY_TIMEOUT_SECS`, `RELIAFLEET_MAX_CONCURRENT_QUERIES`
//! - `RUST_LOG`: logging filter (default: info)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use reliafleet::api::{create_app, AppState};
use reliafleet::config::EngineConfig;
use reliafleet::engine::ReliabilityEngine;
use reliafleet::store::{MemoryStore, Snapshot};

#[derive(Parser, Debug)]
#[command(name = "reliafleet")]
#[command(about = "Fleet reliability metrics & component lifecycle attribution engine")]
#[command(version)]
struct CliArgs {
    /// Path to the engine config TOML
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the JSON maintenance snapshot (overrides config)
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Override the server address (default: "0.0.0.0:8080")
    #[arg(short, long)]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = CliArgs::parse();

    let mut config =
        EngineConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(snapshot) = args.snapshot {
        config.snapshot_path = snapshot;
    }
    if let Some(addr) = args.addr {
        config.listen_addr = addr;
    }

    let snapshot = Snapshot::load(&config.snapshot_path).with_context(|| {
        format!(
            "Failed to load snapshot from {}",
            config.snapshot_path.display()
        )
    })?;
    let store = Arc::new(MemoryStore::new(snapshot));
    let engine = Arc::new(ReliabilityEngine::new(store, &config));

    let app = create_app(AppState { engine });
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!(addr = %config.listen_addr, "Report API listening");

    axum::serve(listener, app)
        .await
        .context("Server terminated")?;
    Ok(())
}
