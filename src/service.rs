//! Producer-side orchestration: commit the order, then announce it.
//!
//! The ordering invariant is durability before notification: no event is
//! ever published for an order that was not committed. The reverse gap is
//! accepted. If the broker is down after the commit, the order stays `NEW`
//! and the event is lost until something re-emits it; there is no outbox
//! relay here, so the gap is logged and counted instead of masked.

use std::sync::Arc;
use tracing::{error, instrument, warn};
use uuid::Uuid;

use crate::domain::{NewOrderItem, Order};
use crate::error::{BrokerError, StoreError};
use crate::metrics;
use crate::publisher::EventPublisher;
use crate::store::OrderStore;

/// Outcome of a successful `place_order` call.
#[derive(Debug)]
pub struct PlacedOrder {
    /// The committed order, status `NEW`.
    pub order: Order,
    /// Whether the `order.created` event reached the broker. `false` means
    /// the order is durable but unannounced, the documented
    /// write-then-publish limitation.
    pub event_published: bool,
}

/// Producer-side order orchestration over injected store and publisher
/// handles.
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    publisher: Arc<dyn EventPublisher>,
}

impl OrderService {
    /// Build a service over explicit dependency handles.
    pub fn new(store: Arc<dyn OrderStore>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { store, publisher }
    }

    /// Create an order and publish its `order.created` event.
    ///
    /// Input is assumed schema-valid (the HTTP boundary rejects
    /// non-positive quantities and prices before this point). A publish
    /// failure does
    /// not roll back the committed order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the transactional write fails; in that
    /// case no event is published.
    #[instrument(skip(self, items), fields(customer_id = %customer_id))]
    pub async fn place_order(
        &self,
        customer_id: Uuid,
        items: Vec<NewOrderItem>,
    ) -> Result<PlacedOrder, StoreError> {
        let order = self.store.create_order(customer_id, items).await?;
        metrics::record_order_created();

        let event_published = match self.publish_created(&order).await {
            Ok(()) => {
                metrics::record_event_published();
                true
            }
            Err(e) => {
                // The order is already durable; only the announcement is
                // lost until redelivered by other means.
                error!(
                    order_id = %order.id,
                    error = %e,
                    "order committed but order.created was not published"
                );
                metrics::record_event_publish_failed();
                false
            }
        };

        Ok(PlacedOrder {
            order,
            event_published,
        })
    }

    /// Load an order for the read path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only for infrastructure failures; an unknown
    /// id is `Ok(None)`.
    pub async fn get_order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        self.store.get_order(id).await
    }

    /// Connect, publish, close. `close` runs on the publish-error path too;
    /// a connect failure skips it (nothing was acquired). The result is the
    /// publish outcome alone: once the broker has confirmed the event, a
    /// failed close handshake cannot retract it.
    async fn publish_created(&self, order: &Order) -> Result<(), BrokerError> {
        self.publisher.connect().await?;
        let published = self
            .publisher
            .publish_order_created(order.id, order.total_price)
            .await;
        if let Err(e) = self.publisher.close().await {
            warn!(order_id = %order.id, error = %e, "failed to close publisher connection");
        }
        published
    }
}
