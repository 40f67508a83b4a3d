//! A thin envelope over a durable AMQP queue: post a message, or receive an
//! infinite auto-acknowledged stream of message bodies. Connection retry
//! uses exponential backoff; once a connection is established, a drop is
//! not retried here — the supervising process is expected to restart.

use std::time::Duration;

use futures::StreamExt;
use lapin::{
    Channel, Connection, ConnectionProperties,
    options::{BasicConsumeOptions, BasicPublishOptions, QueueDeclareOptions},
    types::FieldTable,
};
use thiserror::Error;

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF_BUDGET: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("could not connect to broker within the retry budget: {0}")]
    ConnectTimedOut(lapin::Error),

    #[error("amqp error: {0}")]
    Amqp(#[from] lapin::Error),
}

/// A connected broker session. Cheap to clone: `lapin::Channel` is an
/// internally-reference-counted handle onto the connection.
#[derive(Clone)]
pub struct BrokerAdapter {
    channel: Channel,
}

impl BrokerAdapter {
    /// Connects to `uri`, retrying with exponential backoff (initial 500ms,
    /// doubling) until either a connection succeeds or the cumulative wait
    /// exceeds 60 seconds, at which point the last error is surfaced.
    pub async fn connect(uri: &str) -> Result<Self, BrokerError> {
        let mut backoff = INITIAL_BACKOFF;
        let mut waited = Duration::ZERO;
        let mut last_err = None;

        loop {
            match Connection::connect(uri, ConnectionProperties::default()).await {
                Ok(conn) => {
                    let channel = conn.create_channel().await?;
                    return Ok(BrokerAdapter { channel });
                }
                Err(e) => {
                    log::warn!("broker connect attempt failed: {e}");
                    last_err = Some(e);
                    if waited >= MAX_BACKOFF_BUDGET {
                        break;
                    }
                    tokio::time::sleep(backoff).await;
                    waited += backoff;
                    backoff = (backoff * 2).min(MAX_BACKOFF_BUDGET);
                }
            }
        }

        Err(BrokerError::ConnectTimedOut(last_err.expect(
            "loop only exits via break after at least one failed attempt",
        )))
    }

    /// Publishes `body` to `queue`, durable and persistent, declaring the
    /// queue idempotently if it does not already exist.
    pub async fn post(&self, queue: &str, body: &[u8]) -> Result<(), BrokerError> {
        self.channel
            .queue_declare(queue, durable_queue_options(), FieldTable::default())
            .await?;

        self.channel
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                body,
                lapin::BasicProperties::default()
                    .with_delivery_mode(2), // persistent
            )
            .await?
            .await?;
        Ok(())
    }

    /// Returns a lazy, infinite stream of message bodies from `queue`.
    /// Messages are auto-acknowledged on delivery; the orchestrator sees
    /// at-most-once delivery and has no per-message ack to grant.
    pub async fn receive(
        &self,
        queue: &str,
        consumer_tag: &str,
    ) -> Result<impl futures::Stream<Item = Result<Vec<u8>, BrokerError>>, BrokerError> {
        self.channel
            .queue_declare(queue, durable_queue_options(), FieldTable::default())
            .await?;

        let consumer = self
            .channel
            .basic_consume(
                queue,
                consumer_tag,
                BasicConsumeOptions {
                    no_ack: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        Ok(consumer.map(|delivery| match delivery {
            Ok(delivery) => Ok(delivery.data),
            Err(e) => Err(BrokerError::Amqp(e)),
        }))
    }
}

fn durable_queue_options() -> QueueDeclareOptions {
    QueueDeclareOptions {
        durable: true,
        ..Default::default()
    }
}
