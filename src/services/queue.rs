// src/services/queue.rs

//! Durable queue access over AMQP.
//!
//! Owns the broker connection and channel, declares the URL queue durable,
//! publishes persistent messages, and hands deliveries to the worker with
//! manual acknowledgment. A message is removed from the queue only by an
//! explicit ack; everything un-acked is redelivered by the broker
//! (at-least-once).

use amqprs::BasicProperties;
use amqprs::callbacks::{DefaultChannelCallback, DefaultConnectionCallback};
use amqprs::channel::{
    BasicAckArguments, BasicConsumeArguments, BasicPublishArguments, BasicQosArguments, Channel,
    ConsumerMessage, QueueDeclareArguments,
};
use amqprs::connection::{Connection, OpenConnectionArguments};
use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::BrokerConfig;
use crate::error::Result;

/// Destination for discovered links.
///
/// The queue client is the production implementation; tests substitute an
/// in-memory sink to observe exactly what would have been published.
#[async_trait]
pub trait LinkSink: Send + Sync {
    /// Publish one link as an independent message.
    async fn publish_link(&self, link: &str) -> Result<()>;
}

/// Client for the durable URL queue.
pub struct QueueClient {
    connection: Connection,
    channel: Channel,
    queue: String,
}

impl QueueClient {
    /// Connect to the broker and declare the configured queue.
    ///
    /// The declaration is durable and idempotent; the queue survives broker
    /// restarts. Fails if the broker is unreachable or rejects credentials.
    pub async fn connect(config: &BrokerConfig) -> Result<Self> {
        let args = OpenConnectionArguments::new(
            &config.host,
            config.port,
            &config.username,
            &config.password,
        );
        let connection = Connection::open(&args).await?;
        connection.register_callback(DefaultConnectionCallback).await?;

        let channel = connection.open_channel(None).await?;
        channel.register_callback(DefaultChannelCallback).await?;

        channel
            .queue_declare(QueueDeclareArguments::durable_client_named(&config.queue))
            .await?;

        Ok(Self {
            connection,
            channel,
            queue: config.queue.clone(),
        })
    }

    /// Start consuming deliveries with manual acknowledgment.
    ///
    /// Prefetch is set to 1 so exactly one message is in flight per worker;
    /// awaiting the returned receiver is the worker's suspension point.
    pub async fn consume(&self, consumer_tag: &str) -> Result<UnboundedReceiver<ConsumerMessage>> {
        self.channel
            .basic_qos(BasicQosArguments::new(0, 1, false))
            .await?;

        let args = BasicConsumeArguments::new(&self.queue, consumer_tag)
            .manual_ack(true)
            .finish();
        let (_ctag, receiver) = self.channel.basic_consume_rx(args).await?;
        Ok(receiver)
    }

    /// Acknowledge one delivery.
    pub async fn ack(&self, delivery_tag: u64) -> Result<()> {
        self.channel
            .basic_ack(BasicAckArguments::new(delivery_tag, false))
            .await?;
        Ok(())
    }

    /// Close the channel and connection.
    pub async fn close(self) -> Result<()> {
        self.channel.close().await?;
        self.connection.close().await?;
        Ok(())
    }
}

#[async_trait]
impl LinkSink for QueueClient {
    async fn publish_link(&self, link: &str) -> Result<()> {
        // Payload is the raw UTF-8 bytes of the URL, no envelope.
        // delivery_mode=2 marks the message for disk persistence.
        let properties = BasicProperties::default().with_persistence(true).finish();
        let args = BasicPublishArguments::new("", &self.queue);
        self.channel
            .basic_publish(properties, link.as_bytes().to_vec(), args)
            .await?;
        Ok(())
    }
}
