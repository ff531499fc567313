// src/pipeline/seed.rs

//! One-shot seed submission.

use crate::config::Config;
use crate::error::Result;
use crate::pipeline::process_url;
use crate::services::{FetchAgent, QueueClient};

/// Fetch a single seed URL and publish its links to the queue.
///
/// Runs the same pipeline as the worker, once, without consuming. A fetch
/// failure or a linkless page is a clean run (the absence of links is
/// logged, not an error); only broker connection failures are fatal.
pub async fn run_submitter(config: &Config, seed_url: &str) -> Result<()> {
    let fetcher = FetchAgent::new(&config.fetch)?;
    let queue = QueueClient::connect(&config.broker).await?;

    let published = process_url(&fetcher, &queue, seed_url).await?;
    log::info!("Seeded {published} link(s) from {seed_url}");

    queue.close().await?;
    Ok(())
}
