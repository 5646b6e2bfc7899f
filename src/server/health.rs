//! Liveness endpoint.

use axum::Json;
use serde_json::{Value, json};

/// `GET /health`: static liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
