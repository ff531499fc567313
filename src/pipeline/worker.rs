// src/pipeline/worker.rs

//! Long-running crawl worker.
//!
//! Consumes one URL message at a time, runs the shared pipeline for it, and
//! acknowledges only after every discovered link has been published. The
//! broker redelivers anything left un-acked, so a crash mid-message costs
//! nothing but repeated work.

use std::time::Duration;

use amqprs::channel::ConsumerMessage;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::pipeline::process_url;
use crate::services::{FetchAgent, QueueClient};

const CONSUMER_TAG: &str = "crawlq-worker";

/// Exponential reconnect delay with a cap.
struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: initial,
        }
    }

    /// Delay to sleep now; each subsequent delay doubles up to the cap.
    fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// Run the worker loop until the cancellation token fires.
///
/// Any broker failure — unreachable broker, rejected credentials, a refused
/// consume, a dropped delivery stream — is retried with exponential backoff.
/// The backoff resets only once a delivery actually arrives, so a broker
/// that accepts connections but refuses consumption is still throttled.
/// Un-acked in-flight messages are redelivered.
pub async fn run_worker(config: &Config, cancel: CancellationToken) -> Result<()> {
    let fetcher = FetchAgent::new(&config.fetch)?;
    let mut backoff = Backoff::new(
        Duration::from_secs(config.worker.reconnect_initial_secs),
        Duration::from_secs(config.worker.reconnect_max_secs),
    );

    while !cancel.is_cancelled() {
        match connect_and_consume(config, &fetcher, &cancel, &mut backoff).await {
            // Cancelled at the suspension point.
            Ok(()) => break,
            Err(e) => {
                let delay = backoff.next_delay();
                log::error!("Queue failure: {e}. Retrying in {}s.", delay.as_secs());
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }

    log::info!("Worker shut down.");
    Ok(())
}

/// Connect, then consume deliveries until cancellation or a queue failure.
///
/// Cancellation is only observed between messages; an in-flight message is
/// abandoned un-acked and comes back on redelivery. There is no drain.
async fn connect_and_consume(
    config: &Config,
    fetcher: &FetchAgent,
    cancel: &CancellationToken,
    backoff: &mut Backoff,
) -> Result<()> {
    let queue = QueueClient::connect(&config.broker).await?;
    let mut deliveries = queue.consume(CONSUMER_TAG).await?;
    log::info!("Waiting for URL messages...");

    loop {
        let delivery = tokio::select! {
            _ = cancel.cancelled() => {
                log::info!("Shutdown requested, leaving consume loop.");
                return Ok(());
            }
            delivery = deliveries.recv() => delivery,
        };

        let Some(delivery) = delivery else {
            return Err(AppError::queue("delivery stream closed by broker"));
        };

        // A live delivery proves the broker session is healthy again.
        backoff.reset();

        handle_delivery(fetcher, &queue, delivery).await?;
    }
}

/// Process one delivery end-to-end, then ack it.
async fn handle_delivery(
    fetcher: &FetchAgent,
    queue: &QueueClient,
    delivery: ConsumerMessage,
) -> Result<()> {
    let Some(deliver) = delivery.deliver else {
        return Err(AppError::queue("delivery without a deliver frame"));
    };
    let delivery_tag = deliver.delivery_tag();

    if let Some(url) = decode_payload(delivery.content.unwrap_or_default()) {
        log::info!("Handling URL: {url}");
        process_url(fetcher, queue, &url).await?;
    }

    // Ack only after every publish for this message has been attempted. An
    // ack failure propagates so the outer loop reconnects and the broker
    // redelivers the message.
    queue.ack(delivery_tag).await
}

/// Decode a message payload as a UTF-8 URL string.
///
/// `None` marks a poison message: it is logged and the caller still acks,
/// since a payload that can never be decoded would otherwise redeliver
/// forever.
fn decode_payload(payload: Vec<u8>) -> Option<String> {
    match String::from_utf8(payload) {
        Ok(url) => Some(url),
        Err(e) => {
            log::error!("Discarding non-UTF-8 message payload: {e}");
            None
        }
    }
}
