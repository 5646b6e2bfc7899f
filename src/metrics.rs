//! Prometheus metrics for the order pipeline.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `http_requests_total{method, path}`: HTTP requests served
//! - `orders_created_total`: orders committed by the producer
//! - `orders_processed_total`: processing transitions committed
//! - `orders_events_published_total{outcome}`: publish attempts by outcome
//!   (`published` / `failed`)
//! - `orders_consume_failures_total`: deliveries left unacknowledged
//!
//! ## Histograms
//! - `http_request_duration_seconds{method, path}`: request latency

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Install the Prometheus recorder and return its render handle.
///
/// Idempotent: repeated calls (e.g. across tests sharing one process)
/// return the handle installed first.
///
/// # Errors
///
/// Returns [`BuildError`] if the recorder cannot be installed and no
/// earlier installation exists.
pub fn install() -> Result<PrometheusHandle, BuildError> {
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

    if let Some(handle) = HANDLE.get() {
        return Ok(handle.clone());
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Ok(HANDLE.get_or_init(|| handle).clone()),
        // Lost a race with another installer: use theirs.
        Err(e) => HANDLE.get().cloned().ok_or(e),
    }
}

/// Register metric descriptions. Call once at startup, before anything is
/// recorded.
pub fn describe() {
    describe_counter!("http_requests_total", "Total HTTP requests by method and path");
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request latency by method and path"
    );
    describe_counter!("orders_created_total", "Orders committed by the producer");
    describe_counter!(
        "orders_processed_total",
        "Orders transitioned to PROCESSED by the consumer"
    );
    describe_counter!(
        "orders_events_published_total",
        "order.created publish attempts by outcome (published, failed)"
    );
    describe_counter!(
        "orders_consume_failures_total",
        "Deliveries left unacknowledged by the consumer"
    );
}

/// Record one served HTTP request.
pub fn record_http_request(method: &str, path: &str, duration_secs: f64) {
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_owned(),
        "path" => path.to_owned()
    )
    .increment(1);
    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_owned(),
        "path" => path.to_owned()
    )
    .record(duration_secs);
}

/// Record a committed order.
pub fn record_order_created() {
    metrics::counter!("orders_created_total").increment(1);
}

/// Record a committed processing transition.
pub fn record_order_processed() {
    metrics::counter!("orders_processed_total").increment(1);
}

/// Record a successful `order.created` publish.
pub fn record_event_published() {
    metrics::counter!("orders_events_published_total", "outcome" => "published").increment(1);
}

/// Record a publish attempt that failed after the order was committed.
pub fn record_event_publish_failed() {
    metrics::counter!("orders_events_published_total", "outcome" => "failed").increment(1);
}

/// Record a delivery that was left unacknowledged.
pub fn record_consume_failure() {
    metrics::counter!("orders_consume_failures_total").increment(1);
}
