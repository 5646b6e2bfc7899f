//! In-process fakes for exercising the pipeline without Postgres or a
//! broker.
//!
//! These implement the same seams production code runs against
//! ([`crate::store::OrderStore`], [`crate::publisher::EventPublisher`]), so
//! orchestration tests cover the real control flow.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{self, NewOrderItem, Order, OrderItem, OrderStatus};
use crate::error::{BrokerError, StoreError};
use crate::events::DomainEvent;
use crate::publisher::EventPublisher;
use crate::store::OrderStore;

/// In-memory [`OrderStore`] with the same transactional semantics as the
/// Postgres store (all-or-nothing creates, absent ids as `None`).
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: Mutex<HashMap<Uuid, Order>>,
}

impl InMemoryOrderStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted orders.
    pub async fn order_count(&self) -> usize {
        self.orders.lock().await.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create_order(
        &self,
        customer_id: Uuid,
        items: Vec<NewOrderItem>,
    ) -> Result<Order, StoreError> {
        let order_id = Uuid::new_v4();
        let now = Utc::now();
        let total_price = domain::total_price(&items);

        let items = items
            .into_iter()
            .map(|item| OrderItem {
                id: Uuid::new_v4(),
                order_id,
                product_id: item.product_id,
                quantity: item.quantity,
                price: item.price,
            })
            .collect();

        let order = Order {
            id: order_id,
            customer_id,
            status: OrderStatus::New,
            total_price,
            created_at: now,
            updated_at: now,
            items,
        };

        self.orders.lock().await.insert(order_id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.lock().await.get(&id).cloned())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Order>, StoreError> {
        let mut orders = self.orders.lock().await;
        let Some(order) = orders.get_mut(&id) else {
            return Ok(None);
        };
        order.status = status;
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }
}

/// [`OrderStore`] whose every operation fails, for exercising persistence
/// failure paths.
#[derive(Default)]
pub struct FailingStore;

#[async_trait]
impl OrderStore for FailingStore {
    async fn create_order(
        &self,
        _customer_id: Uuid,
        _items: Vec<NewOrderItem>,
    ) -> Result<Order, StoreError> {
        Err(StoreError::Unavailable("injected store failure".into()))
    }

    async fn get_order(&self, _id: Uuid) -> Result<Option<Order>, StoreError> {
        Err(StoreError::Unavailable("injected store failure".into()))
    }

    async fn update_status(
        &self,
        _id: Uuid,
        _status: OrderStatus,
    ) -> Result<Option<Order>, StoreError> {
        Err(StoreError::Unavailable("injected store failure".into()))
    }
}

/// [`EventPublisher`] that captures published events instead of talking to
/// a broker, and counts lifecycle calls so tests can assert the
/// connect/publish/close discipline.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<DomainEvent>>,
    connects: AtomicUsize,
    closes: AtomicUsize,
}

impl RecordingPublisher {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events captured so far.
    pub async fn published(&self) -> Vec<DomainEvent> {
        self.events.lock().await.clone()
    }

    /// Number of `connect` calls observed.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Number of `close` calls observed.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn connect(&self) -> Result<(), BrokerError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn publish_order_created(
        &self,
        order_id: Uuid,
        total_price: Decimal,
    ) -> Result<(), BrokerError> {
        self.events
            .lock()
            .await
            .push(DomainEvent::order_created(order_id, total_price));
        Ok(())
    }

    async fn close(&self) -> Result<(), BrokerError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Where a [`FailingPublisher`] fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublisherFailure {
    /// `connect` fails; nothing is acquired, so `close` is not expected.
    OnConnect,
    /// `connect` succeeds, `publish` fails; `close` must still run.
    OnPublish,
    /// `connect` and `publish` succeed, `close` fails; the publish already
    /// reached the broker.
    OnClose,
}

/// [`EventPublisher`] that fails at a chosen lifecycle step.
pub struct FailingPublisher {
    failure: PublisherFailure,
    closes: AtomicUsize,
}

impl FailingPublisher {
    /// Create a publisher failing at the given step.
    #[must_use]
    pub const fn new(failure: PublisherFailure) -> Self {
        Self {
            failure,
            closes: AtomicUsize::new(0),
        }
    }

    /// Number of `close` calls observed.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventPublisher for FailingPublisher {
    async fn connect(&self) -> Result<(), BrokerError> {
        match self.failure {
            PublisherFailure::OnConnect => {
                Err(BrokerError::Connection("injected connect failure".into()))
            }
            PublisherFailure::OnPublish | PublisherFailure::OnClose => Ok(()),
        }
    }

    async fn publish_order_created(
        &self,
        _order_id: Uuid,
        _total_price: Decimal,
    ) -> Result<(), BrokerError> {
        match self.failure {
            PublisherFailure::OnClose => Ok(()),
            _ => Err(BrokerError::Publish("injected publish failure".into())),
        }
    }

    async fn close(&self) -> Result<(), BrokerError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        match self.failure {
            PublisherFailure::OnClose => {
                Err(BrokerError::Connection("injected close failure".into()))
            }
            _ => Ok(()),
        }
    }
}
