//! End-to-end HTTP behavior over in-process fakes: intake, reads, contract
//! bodies, validation, and operational endpoints.

#![allow(clippy::unwrap_used)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use orderflow::metrics;
use orderflow::processor::OrderProcessor;
use orderflow::server::{AppState, build_router};
use orderflow::service::OrderService;
use orderflow::testing::{InMemoryOrderStore, RecordingPublisher};

struct TestApp {
    router: Router,
    store: Arc<InMemoryOrderStore>,
    publisher: Arc<RecordingPublisher>,
}

fn test_app() -> TestApp {
    let store = Arc::new(InMemoryOrderStore::new());
    let publisher = Arc::new(RecordingPublisher::new());
    let service = Arc::new(OrderService::new(store.clone(), publisher.clone()));
    let handle = metrics::install().unwrap();
    let router = build_router(AppState::new(service, handle));
    TestApp {
        router,
        store,
        publisher,
    }
}

fn post_orders(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/orders")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn two_item_request(customer_id: Uuid) -> Value {
    json!({
        "customer_id": customer_id,
        "items": [
            {"product_id": Uuid::new_v4(), "quantity": 2, "price": "50.00"},
            {"product_id": Uuid::new_v4(), "quantity": 1, "price": "30.00"}
        ]
    })
}

#[tokio::test]
async fn create_order_returns_created_with_totals() {
    let app = test_app();
    let customer_id = Uuid::new_v4();

    let response = app
        .router
        .oneshot(post_orders(&two_item_request(customer_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await;
    assert_eq!(body["status"], "NEW");
    assert_eq!(body["total_price"], "130.00");
    assert_eq!(body["customer_id"], customer_id.to_string());
    assert_eq!(body["items"].as_array().unwrap().len(), 2);

    let order_id: Uuid = body["order_id"].as_str().unwrap().parse().unwrap();
    let events = app.publisher.published().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].payload.order_id, order_id);
}

#[tokio::test]
async fn created_order_is_readable_and_processable() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(post_orders(&two_item_request(Uuid::new_v4())))
        .await
        .unwrap();
    let created = json_body(response).await;
    let order_id: Uuid = created["order_id"].as_str().unwrap().parse().unwrap();

    let response = app
        .router
        .clone()
        .oneshot(get(&format!("/orders/{order_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "NEW");

    // Simulate the worker applying the transition, then read again.
    OrderProcessor::new(app.store.clone())
        .process(order_id)
        .await
        .unwrap();

    let response = app
        .router
        .oneshot(get(&format!("/orders/{order_id}")))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["status"], "PROCESSED");
    assert_eq!(body["total_price"], "130.00");
}

#[tokio::test]
async fn unknown_order_is_404_with_exact_detail() {
    let app = test_app();

    let response = app
        .router
        .oneshot(get(&format!("/orders/{}", Uuid::new_v4())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await, json!({"detail": "Order not found"}));
}

#[tokio::test]
async fn non_positive_quantity_is_rejected_before_any_effect() {
    let app = test_app();
    let body = json!({
        "customer_id": Uuid::new_v4(),
        "items": [{"product_id": Uuid::new_v4(), "quantity": 0, "price": "10.00"}]
    });

    let response = app.router.oneshot(post_orders(&body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.store.order_count().await, 0);
    assert!(app.publisher.published().await.is_empty());
}

#[tokio::test]
async fn extreme_price_is_rejected_before_any_effect() {
    let app = test_app();
    // Decimal::MAX as a JSON string: parses fine, far beyond NUMERIC(10,2).
    let body = json!({
        "customer_id": Uuid::new_v4(),
        "items": [{
            "product_id": Uuid::new_v4(),
            "quantity": 2,
            "price": "79228162514264337593543950335"
        }]
    });

    let response = app.router.oneshot(post_orders(&body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.store.order_count().await, 0);
    assert!(app.publisher.published().await.is_empty());
}

#[tokio::test]
async fn non_positive_price_is_rejected_before_any_effect() {
    let app = test_app();
    let body = json!({
        "customer_id": Uuid::new_v4(),
        "items": [{"product_id": Uuid::new_v4(), "quantity": 1, "price": "-1.00"}]
    });

    let response = app.router.oneshot(post_orders(&body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.store.order_count().await, 0);
}

#[tokio::test]
async fn trailing_slash_intake_also_works() {
    let app = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/orders/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(two_item_request(Uuid::new_v4()).to_string()))
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn health_returns_exact_body() {
    let app = test_app();

    let response = app.router.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn metrics_endpoint_renders() {
    let app = test_app();

    // Serve one real request first so there is something to scrape.
    app.router
        .clone()
        .oneshot(get("/health"))
        .await
        .unwrap();

    let response = app.router.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
