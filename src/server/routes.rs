//! Router assembly and request instrumentation.

use axum::Router;
use axum::extract::{MatchedPath, Request, State};
use axum::middleware::{self, Next};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use std::time::Instant;

use super::health::health;
use super::orders::{create_order, get_order};
use super::state::AppState;
use crate::metrics;

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/", post(create_order))
        .route("/orders/:order_id", get(get_order))
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .layer(middleware::from_fn(track_metrics))
        .with_state(state)
}

/// `GET /metrics`: Prometheus exposition text.
async fn render_metrics(State(state): State<AppState>) -> String {
    state.metrics.render()
}

/// Record count and latency per request, labeled by route pattern rather
/// than the raw path so ids do not explode label cardinality.
async fn track_metrics(request: Request, next: Next) -> impl IntoResponse {
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path().to_owned(), |p| p.as_str().to_owned());
    let method = request.method().to_string();

    let start = Instant::now();
    let response = next.run(request).await;
    metrics::record_http_request(&method, &path, start.elapsed().as_secs_f64());
    response
}
