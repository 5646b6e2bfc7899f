//! Domain-event publication to the AMQP broker.
//!
//! Events go to a topic exchange rather than a direct queue binding so
//! future consumers can subscribe to subsets of event types without
//! touching the publisher.

use async_trait::async_trait;
use lapin::options::{BasicPublishOptions, ExchangeDeclareOptions};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::BrokerError;
use crate::events::{DomainEvent, EVENT_CONTENT_TYPE, ORDERS_EXCHANGE, ORDER_CREATED_KEY};

/// Publisher seam for `order.created` events.
///
/// The contract mirrors the connection lifecycle: `connect` before
/// `publish_order_created`, `close` on every exit path (`close` is a no-op
/// if never connected).
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Establish a broker connection and declare the `orders` topic
    /// exchange. Redeclaring an existing exchange of the same type is a
    /// no-op on the broker side.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Connection`] if the broker is unreachable or
    /// the declaration is rejected. Callers decide whether to retry.
    async fn connect(&self) -> Result<(), BrokerError>;

    /// Publish an `order.created` event for a committed order.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Publish`] if the broker rejects the message
    /// (rejections surface synchronously and are never silently dropped),
    /// and [`BrokerError::NotConnected`] if called before `connect`.
    async fn publish_order_created(
        &self,
        order_id: Uuid,
        total_price: Decimal,
    ) -> Result<(), BrokerError>;

    /// Release the broker connection. A no-op if never connected.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Connection`] if the close handshake fails.
    async fn close(&self) -> Result<(), BrokerError>;
}

/// AMQP implementation of [`EventPublisher`] over lapin.
pub struct AmqpEventPublisher {
    url: String,
    state: Mutex<Option<(Connection, Channel)>>,
}

impl AmqpEventPublisher {
    /// Create a publisher for the given broker URL. No I/O happens until
    /// [`EventPublisher::connect`].
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            state: Mutex::new(None),
        }
    }
}

#[async_trait]
impl EventPublisher for AmqpEventPublisher {
    async fn connect(&self) -> Result<(), BrokerError> {
        let connection = Connection::connect(&self.url, ConnectionProperties::default())
            .await
            .map_err(|e| BrokerError::Connection(format!("failed to connect: {e}")))?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| BrokerError::Connection(format!("failed to create channel: {e}")))?;

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
            .await
            .map_err(|e| BrokerError::Connection(format!("failed to declare exchange: {e}")))?;

        *self.state.lock().await = Some((connection, channel));
        debug!(exchange = ORDERS_EXCHANGE, "publisher connected");
        Ok(())
    }

    async fn publish_order_created(
        &self,
        order_id: Uuid,
        total_price: Decimal,
    ) -> Result<(), BrokerError> {
        let guard = self.state.lock().await;
        let (_, channel) = guard.as_ref().ok_or(BrokerError::NotConnected)?;

        let event = DomainEvent::order_created(order_id, total_price);
        let body = event.to_bytes()?;

        let confirm = channel
            .basic_publish(
                ORDERS_EXCHANGE,
                ORDER_CREATED_KEY,
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default()
                    .with_content_type(EVENT_CONTENT_TYPE.into())
                    .with_delivery_mode(2), // persistent
            )
            .await
            .map_err(|e| BrokerError::Publish(format!("publish failed: {e}")))?;

        confirm
            .await
            .map_err(|e| BrokerError::Publish(format!("publish not confirmed: {e}")))?;

        info!(
            event_id = %event.event_id,
            order_id = %order_id,
            routing_key = ORDER_CREATED_KEY,
            "published order.created"
        );
        Ok(())
    }

    async fn close(&self) -> Result<(), BrokerError> {
        if let Some((connection, _)) = self.state.lock().await.take() {
            connection
                .close(200, "client shutdown")
                .await
                .map_err(|e| BrokerError::Connection(format!("failed to close: {e}")))?;
        }
        Ok(())
    }
}
