//! pcdoc Control - command-line client for the diagnosis engine

mod cli;
mod commands;
mod display;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use pcdoc_common::PcdocConfig;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Warnings only unless RUST_LOG says otherwise; stdout stays clean for --json
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = PcdocConfig::load(cli.config.as_deref())?;
    if let Some(path) = cli.knowledge {
        config.knowledge.static_path = path;
    }
    let engine = commands::open_engine(&config)?;

    match cli.command {
        Commands::Diagnose {
            symptoms,
            strategy,
            json,
        } => commands::diagnose(&engine, symptoms, strategy, json),
        Commands::Symptoms { category, json } => commands::symptoms(&engine, category, json),
        Commands::Categories => commands::categories(&engine),
        Commands::Contribute { item } => commands::contribute(&engine, item),
    }
}
