//! pcdoc Daemon - PC fault diagnosis service
//!
//! Loads the knowledge base once, then serves diagnoses and accepts user
//! contributions over HTTP.

use anyhow::{Context, Result};
use clap::Parser;
use pcdoc_common::{DiagnosisEngine, PcdocConfig};
use pcdocd::server::{self, AppState};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// pcdoc diagnosis daemon
#[derive(Parser)]
#[command(name = "pcdocd")]
#[command(about = "pcdoc - PC fault diagnosis service", long_about = None)]
#[command(version)]
struct Args {
    /// Config file (overrides $PCDOC_CONFIG and defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on (overrides server.bind)
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    info!("pcdoc Daemon v{} starting", env!("CARGO_PKG_VERSION"));

    let config = PcdocConfig::load(args.config.as_deref())?;

    // A broken knowledge base must stop startup
    let engine = DiagnosisEngine::from_config(&config).with_context(|| {
        format!(
            "Cannot start with knowledge base {}",
            config.knowledge.static_path.display()
        )
    })?;
    info!(
        "Default strategy: {}, scoring threshold: {}",
        config.inference.default_strategy, config.inference.scoring_threshold
    );

    let bind = args.bind.unwrap_or(config.server.bind);
    server::run(AppState::new(engine), &bind).await?;

    info!("pcdoc Daemon stopped");
    Ok(())
}
