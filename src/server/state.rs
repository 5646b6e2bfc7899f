//! Shared per-request state.

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use crate::service::OrderService;

/// State cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Producer-side orchestration.
    pub service: Arc<OrderService>,
    /// Render handle for the `/metrics` endpoint.
    pub metrics: PrometheusHandle,
}

impl AppState {
    /// Assemble the state handed to [`crate::server::build_router`].
    #[must_use]
    pub fn new(service: Arc<OrderService>, metrics: PrometheusHandle) -> Self {
        Self { service, metrics }
    }
}
