//! repara - vehicle diagnostic service
//!
//! # Usage
//!
//! ```bash
//! # Run with defaults (rule-engine-only pipeline)
//! cargo run --release
//!
//! # Run with external AI enrichment
//! OPENAI_API_KEY=... cargo run --release
//!
//! # Reproducible OBD2 simulator output
//! cargo run --release -- --obd-seed 42
//! ```
//!
//! # Environment Variables
//!
//! - `REPARA_CONFIG`: Path to a TOML config file (default: ./repara.toml)
//! - `OPENAI_API_KEY` / `GEMINI_API_KEY`: enable the respective provider
//! - `RUST_LOG`: Logging level (default: info)

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use repara::api::{create_app, ApiState};
use repara::config::{self, AppConfig};
use repara::obd::Obd2Simulator;
use repara::providers::ProviderChain;
use repara::store::InMemoryDiagnosisStore;
use repara::DiagnosticEngine;

#[derive(Parser, Debug)]
#[command(name = "repara")]
#[command(about = "Repara vehicle diagnostic service")]
#[command(version)]
struct CliArgs {
    /// Override the server bind address (default from config: "0.0.0.0:8000")
    #[arg(short, long)]
    addr: Option<String>,

    /// Seed for the OBD2 simulator RNG (omit for entropy)
    #[arg(long)]
    obd_seed: Option<u64>,

    /// Disable external AI providers even when credentials are present
    #[arg(long)]
    no_providers: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; ignore a missing file
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();

    config::init(AppConfig::load());
    let cfg = config::get();

    let providers = if args.no_providers {
        None
    } else {
        ProviderChain::from_env(&cfg.providers)
    };
    if providers.is_none() {
        info!("no external providers configured — running rule-engine-only");
    }

    let store = Arc::new(InMemoryDiagnosisStore::new());
    let engine = Arc::new(DiagnosticEngine::new(store).with_providers(providers));
    let state = ApiState::new(engine, Obd2Simulator::new(args.obd_seed));

    let addr = args.addr.unwrap_or_else(|| cfg.server.addr.clone());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "repara listening");

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::error!("failed to install Ctrl+C handler");
    }
}
