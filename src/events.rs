//! Wire-level domain events and the broker names shared by both sides.
//!
//! Publisher and consumer declare the exchange from the same constants, so
//! the "name and type must match exactly" requirement holds structurally
//! rather than by convention.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Topic exchange all order events are published to.
pub const ORDERS_EXCHANGE: &str = "orders";

/// Routing key (and event type) for order-creation events.
pub const ORDER_CREATED_KEY: &str = "order.created";

/// Durable queue the processing worker consumes from.
pub const PROCESSING_QUEUE: &str = "order-processing";

/// Content type stamped on every published message.
pub const EVENT_CONTENT_TYPE: &str = "application/json";

/// Event-specific fields of an `order.created` event.
///
/// `total_price` crosses the wire as an exact decimal string (serde's
/// default rendering for [`Decimal`]), never as a binary float.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedPayload {
    /// The committed order this event announces.
    pub order_id: Uuid,
    /// The order's total at creation time.
    pub total_price: Decimal,
}

/// The JSON envelope published for every domain event.
///
/// `event_id` is unique per publish attempt, so a redelivered message and a
/// re-published event are distinguishable in logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique identifier for this publish attempt.
    pub event_id: Uuid,
    /// Event type tag, e.g. `order.created`.
    pub event_type: String,
    /// Publication timestamp (RFC 3339).
    pub occurred_at: DateTime<Utc>,
    /// Event-specific fields.
    pub payload: OrderCreatedPayload,
}

impl DomainEvent {
    /// Build a fresh `order.created` event for a committed order.
    #[must_use]
    pub fn order_created(order_id: Uuid, total_price: Decimal) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type: ORDER_CREATED_KEY.to_string(),
            occurred_at: Utc::now(),
            payload: OrderCreatedPayload {
                order_id,
                total_price,
            },
        }
    }

    /// Serialize to the UTF-8 JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decode a message body received from the broker.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error for malformed JSON or a
    /// missing/invalid field (including a bad `payload.order_id`).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
