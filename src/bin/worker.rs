//! crawlq worker
//!
//! Long-running role: consumes URL messages from the durable queue, crawls
//! each one, and republishes discovered same-origin links until interrupted.

use std::path::PathBuf;

use clap::Parser;
use crawlq::{config::Config, error::Result, pipeline};
use tokio_util::sync::CancellationToken;

/// crawlq - queue-driven crawl worker
#[derive(Parser, Debug)]
#[command(name = "crawlq-worker", version, about = "Queue-driven crawl worker")]
struct Cli {
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

/// Main entry point for the worker role.
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

    log::info!(
        "crawlq worker starting (queue \"{}\" on {}:{})",
        config.broker.queue,
        config.broker.host,
        config.broker.port
    );

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Interrupt received, shutting down...");
            signal_cancel.cancel();
        }
    });

    pipeline::run_worker(&config, cancel).await
}
