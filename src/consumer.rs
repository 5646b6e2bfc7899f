//! Durable subscription to `order.created` events.
//!
//! The consumer declares the same topic exchange as the publisher (shared
//! constants in [`crate::events`]), binds the durable `order-processing`
//! queue, and handles one message at a time under a manual-ack scope: a
//! message is acknowledged only after the processing transition has
//! committed. Any failure inside the scope (malformed body, unknown order,
//! store error) leaves the message unacknowledged so the broker can
//! redeliver it or surface it for inspection; nothing is silently dropped.

use futures::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicQosOptions, ExchangeDeclareOptions,
    QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{Connection, ConnectionProperties, ExchangeKind};
use tracing::{debug, error, info};

use crate::domain::Order;
use crate::error::ConsumeError;
use crate::events::{DomainEvent, ORDERS_EXCHANGE, ORDER_CREATED_KEY, PROCESSING_QUEUE};
use crate::metrics;
use crate::processor::OrderProcessor;

/// Long-lived worker that drains the `order-processing` queue.
pub struct OrderConsumer {
    url: String,
    processor: OrderProcessor,
}

impl OrderConsumer {
    /// Build a consumer for the given broker URL. No I/O happens until
    /// [`OrderConsumer::run`].
    #[must_use]
    pub fn new(url: impl Into<String>, processor: OrderProcessor) -> Self {
        Self {
            url: url.into(),
            processor,
        }
    }

    /// Connect, declare the topology, and process deliveries until the
    /// stream ends or broker I/O fails. The worker binary wraps this in a
    /// reconnect loop.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumeError::Broker`] for connection, declaration,
    /// binding, or acknowledgment failures. Per-message handling failures
    /// are not errors of the loop: they leave the message unacknowledged
    /// and the loop continues.
    pub async fn run(&self) -> Result<(), ConsumeError> {
        let connection = Connection::connect(&self.url, ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;

        // Must match the publisher's declaration exactly; a name/type
        // mismatch is a fatal configuration error the broker reports here.
        channel
            .exchange_declare(
                ORDERS_EXCHANGE,
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        channel
            .queue_declare(
                PROCESSING_QUEUE,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        channel
            .queue_bind(
                PROCESSING_QUEUE,
                ORDERS_EXCHANGE,
                ORDER_CREATED_KEY,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;

        // One unacknowledged message at a time on this channel.
        channel.basic_qos(1, BasicQosOptions::default()).await?;

        let mut deliveries = channel
            .basic_consume(
                PROCESSING_QUEUE,
                "orderflow-worker",
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        info!(
            queue = PROCESSING_QUEUE,
            routing_key = ORDER_CREATED_KEY,
            "consuming order events"
        );

        while let Some(delivery) = deliveries.next().await {
            let delivery = delivery?;
            match self.handle_message(&delivery.data).await {
                Ok(order) => {
                    delivery.ack(BasicAckOptions::default()).await?;
                    debug!(order_id = %order.id, "acknowledged order.created");
                }
                Err(e) => {
                    // Deliberately not acked: the broker redelivers once the
                    // channel closes, or the message surfaces for manual
                    // inspection.
                    error!(error = %e, "failed to handle delivery, leaving message unacknowledged");
                    metrics::record_consume_failure();
                }
            }
        }

        Ok(())
    }

    /// Decode one message body and apply the processing transition.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumeError::Decode`] for malformed JSON or a
    /// missing/invalid order id, and [`ConsumeError::Process`] when the
    /// transition fails.
    pub async fn handle_message(&self, body: &[u8]) -> Result<Order, ConsumeError> {
        let event = DomainEvent::from_bytes(body)?;
        debug!(
            event_id = %event.event_id,
            event_type = %event.event_type,
            order_id = %event.payload.order_id,
            "received event"
        );
        let order = self.processor.process(event.payload.order_id).await?;
        Ok(order)
    }
}
