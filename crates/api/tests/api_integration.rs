//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use purchase::FakePaymentGateway;
use serde_json::{Value, json};
use store::{Concert, InMemoryStore, Money, NewConcert, Store};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    app: axum::Router,
    store: InMemoryStore,
    payment: FakePaymentGateway,
}

fn setup() -> TestApp {
    let store = InMemoryStore::new();
    let (state, payment) = api::create_default_state(store.clone(), "valid payment token");
    let app = api::create_app(state, get_metrics_handle());
    TestApp {
        app,
        store,
        payment,
    }
}

async fn create_concert(store: &InMemoryStore, published: bool, tickets: u32) -> Concert {
    let mut builder = NewConcert::builder()
        .title("The Red Chord")
        .subtitle("with Animosity and Lethargy")
        .ticket_price(Money::from_cents(3250))
        .venue("The Mosh Pit", "123 Example Lane")
        .location("Laraville", "ON", "17916")
        .additional_information("For tickets, call (555) 555-5555.");
    if published {
        builder = builder.published();
    }
    let concert = store.insert_concert(builder.build()).await.unwrap();
    store.insert_tickets(concert.id, tickets).await.unwrap();
    concert
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn order_request(concert_id: impl std::fmt::Display, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/api/v1/concerts/{concert_id}/orders"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let test = setup();

    let (status, json) = send(&test.app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_list_only_published_concerts() {
    let test = setup();
    let published = create_concert(&test.store, true, 0).await;
    create_concert(&test.store, false, 0).await;

    let (status, json) = send(&test.app, get("/api/v1/concerts")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 1);
    assert_eq!(json["data"][0]["id"], published.id.as_i64());
    assert_eq!(json["data"][0]["ticket_price"], 3250);
    assert!(json.get("error").is_none());
}

#[tokio::test]
async fn test_view_published_concert() {
    let test = setup();
    let concert = create_concert(&test.store, true, 0).await;

    let (status, json) = send(&test.app, get(&format!("/api/v1/concerts/{}", concert.id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["title"], "The Red Chord");
    assert_eq!(json["data"]["venue"], "The Mosh Pit");
    assert_eq!(json["data"]["city"], "Laraville");
    assert!(json.get("count").is_none());
}

#[tokio::test]
async fn test_unpublished_concert_is_not_found() {
    let test = setup();
    let concert = create_concert(&test.store, false, 0).await;

    let (status, json) = send(&test.app, get(&format!("/api/v1/concerts/{}", concert.id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["message"], "Concert not found");
    assert!(json["data"].is_null());
}

#[tokio::test]
async fn test_invalid_concert_id() {
    let test = setup();

    let (status, json) = send(&test.app, get("/api/v1/concerts/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["message"], "id \"abc\" is invalid");
}

#[tokio::test]
async fn test_unknown_endpoint() {
    let test = setup();

    let (status, json) = send(&test.app, get("/api/v1/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["message"], "sorry, endpoint is not found");
}

#[tokio::test]
async fn test_customer_can_purchase_tickets() {
    let test = setup();
    let concert = create_concert(&test.store, true, 3).await;

    let (status, json) = send(
        &test.app,
        order_request(
            concert.id,
            json!({
                "email": "john@example.com",
                "ticket_quantity": 3,
                "payment_token": "valid payment token"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["email"], "john@example.com");
    assert_eq!(json["data"]["amount"], 9750);
    assert_eq!(json["data"]["tickets"].as_array().unwrap().len(), 3);
    assert_eq!(test.payment.total_charged(), Money::from_cents(9750));
    assert_eq!(test.store.count_available_tickets(concert.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_cannot_purchase_unpublished_concert_tickets() {
    let test = setup();
    let concert = create_concert(&test.store, false, 3).await;

    let (status, json) = send(
        &test.app,
        order_request(
            concert.id,
            json!({
                "email": "john@example.com",
                "ticket_quantity": 3,
                "payment_token": "valid payment token"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["message"], "Concert not found");
    assert_eq!(test.store.order_count().await, 0);
    assert_eq!(test.payment.charge_count(), 0);
}

#[tokio::test]
async fn test_cannot_purchase_more_tickets_than_remain() {
    let test = setup();
    let concert = create_concert(&test.store, true, 50).await;

    let (status, json) = send(
        &test.app,
        order_request(
            concert.id,
            json!({
                "email": "john@example.com",
                "ticket_quantity": 51,
                "payment_token": "valid payment token"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        json["error"]["message"],
        "tickets not enough to fulfil request"
    );
    assert_eq!(test.store.order_count().await, 0);
    assert_eq!(test.store.count_available_tickets(concert.id).await.unwrap(), 50);
}

#[tokio::test]
async fn test_order_is_not_created_when_payment_fails() {
    let test = setup();
    let concert = create_concert(&test.store, true, 1).await;

    let (status, json) = send(
        &test.app,
        order_request(
            concert.id,
            json!({
                "email": "jon@example.com",
                "ticket_quantity": 1,
                "payment_token": "invalid payment token"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"]["message"], "invalid payment token");
    assert!(
        test.store
            .find_order_by_email("jon@example.com")
            .await
            .unwrap()
            .is_none()
    );
    assert_eq!(test.store.count_available_tickets(concert.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_validation_errors() {
    let test = setup();
    let concert = create_concert(&test.store, true, 3).await;

    let cases = [
        (
            json!({ "ticket_quantity": 1, "payment_token": "valid payment token" }),
            "email",
            "email is required",
        ),
        (
            json!({ "email": "not-an-email", "ticket_quantity": 1, "payment_token": "valid payment token" }),
            "email",
            "email must be a valid email address",
        ),
        (
            json!({ "email": "jon@example.com", "payment_token": "valid payment token" }),
            "ticket_quantity",
            "ticket_quantity is required",
        ),
        (
            json!({ "email": "jon@example.com", "ticket_quantity": -1, "payment_token": "valid payment token" }),
            "ticket_quantity",
            "ticket_quantity must be 1 or greater",
        ),
        (
            json!({ "email": "jon@example.com", "ticket_quantity": 1, "payment_token": "" }),
            "payment_token",
            "payment_token is required",
        ),
    ];

    for (body, field, message) in cases {
        let (status, json) = send(&test.app, order_request(concert.id, body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{message}");
        assert_eq!(
            json,
            json!({ "errors": [{ "field": field, "message": message }] })
        );
    }

    assert_eq!(test.store.order_count().await, 0);
    assert_eq!(test.payment.charge_count(), 0);
}

#[tokio::test]
async fn test_malformed_body() {
    let test = setup();
    let concert = create_concert(&test.store, true, 3).await;

    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/v1/concerts/{}/orders", concert.id))
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, json) = send(&test.app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"]["message"].as_str().is_some());
    assert!(json["data"].is_null());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let test = setup();
    let concert = create_concert(&test.store, true, 1).await;

    send(
        &test.app,
        order_request(
            concert.id,
            json!({
                "email": "john@example.com",
                "ticket_quantity": 1,
                "payment_token": "valid payment token"
            }),
        ),
    )
    .await;

    let response = test.app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("purchases_total"));
}
