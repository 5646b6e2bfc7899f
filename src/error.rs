//! Typed failures for the order pipeline.
//!
//! Each concern gets its own enum so orchestration layers can decide retry
//! vs. propagate vs. leave-unacknowledged per variant. "Not found" is never
//! modeled as an error at the store boundary: lookups return `Option` and
//! only the consumer-side processor promotes an absent order to
//! [`ProcessError::OrderNotFound`], because there it is an actionable
//! outcome rather than control flow.

use thiserror::Error;
use uuid::Uuid;

/// Failures raised by the order store.
///
/// Every variant is fatal for the current operation; the store's transaction
/// boundaries guarantee that no partial write is left visible.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying database call failed.
    #[error("database failure: {0}")]
    Database(#[from] sqlx::Error),

    /// Running embedded migrations failed.
    #[error("migration failure: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// A persisted row violates a domain invariant (e.g. an order status
    /// outside the known lifecycle).
    #[error("data integrity violation: {0}")]
    Integrity(String),

    /// The storage backend is unreachable.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Failures raised by the event publisher.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Connecting to the broker or declaring the exchange failed.
    #[error("broker connection failed: {0}")]
    Connection(String),

    /// The broker rejected the publish.
    #[error("broker rejected publish: {0}")]
    Publish(String),

    /// The event could not be serialized to its wire form.
    #[error("event serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// `publish` was called before `connect`.
    #[error("publisher is not connected")]
    NotConnected,
}

/// Failures raised while applying the processing transition to an order.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The referenced order does not exist. Expected and recoverable: the
    /// consumer leaves the message unacknowledged instead of crashing.
    #[error("order {0} not found")]
    OrderNotFound(Uuid),

    /// The store failed while loading or committing the transition.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures raised inside the message consumer.
#[derive(Debug, Error)]
pub enum ConsumeError {
    /// Broker I/O failed (connect, declare, bind, consume, ack).
    #[error("broker failure: {0}")]
    Broker(#[from] lapin::Error),

    /// The message body was not a well-formed `order.created` event.
    #[error("malformed event payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// The decoded event could not be processed.
    #[error(transparent)]
    Process(#[from] ProcessError),
}
