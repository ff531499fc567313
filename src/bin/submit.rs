//! crawlq submit
//!
//! One-shot role: fetches a seed URL, extracts its same-origin links, and
//! publishes them to the queue to bootstrap the crawl cycle.
//!
//! Exits 0 on completion even when the seed yields no links; only broker
//! connection and configuration failures are fatal.

use std::path::PathBuf;

use clap::Parser;
use crawlq::{config::Config, error::Result, pipeline};

/// crawlq - seed submitter
#[derive(Parser, Debug)]
#[command(name = "crawlq-submit", version, about = "Seed the crawl queue from one URL")]
struct Cli {
    /// Seed URL to fetch links from
    url: String,

    /// Path to a TOML config file (broker settings also honor RABBITMQ_* env vars)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the submitter role.
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => Config::load_or_default(path),
        None => Config::default(),
    };
    config.apply_env()?;
    config.validate()?;

    pipeline::run_submitter(&config, &cli.url).await
}
