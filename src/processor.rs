//! Consumer-side state transition from `NEW` to `PROCESSED`.

use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{Order, OrderStatus};
use crate::error::ProcessError;
use crate::metrics;
use crate::store::OrderStore;

/// Applies the processing transition to orders referenced by consumed
/// events.
pub struct OrderProcessor {
    store: Arc<dyn OrderStore>,
}

impl OrderProcessor {
    /// Build a processor over an injected store handle.
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    /// Load the order and commit the `PROCESSED` status.
    ///
    /// The transport delivers at least once, so this must tolerate a second
    /// invocation for the same id: setting the terminal state
    /// unconditionally makes re-processing a no-op in effect. Do not add
    /// already-processed checks here.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::OrderNotFound`] if the id is unknown (no
    /// commit happens and the caller decides the redelivery policy), or
    /// [`ProcessError::Store`] for infrastructure failures.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn process(&self, order_id: Uuid) -> Result<Order, ProcessError> {
        let order = self
            .store
            .update_status(order_id, OrderStatus::Processed)
            .await?
            .ok_or(ProcessError::OrderNotFound(order_id))?;

        metrics::record_order_processed();
        info!(order_id = %order.id, status = %order.status, "order processed");
        Ok(order)
    }
}
