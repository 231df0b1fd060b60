//! REST client tests against an in-process fake of the remote service.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use checkout::{
    CheckoutError, NewOrder, NewOrderLine, OrderHistory, OrderService, OrderStatus,
    PaymentRequest, PaymentService, RestClient, StockReconciler, StockService,
};
use common::{CustomerId, Money, OrderId, ProductId};
use serde_json::{Value, json};
use tokio::sync::Mutex;

#[derive(Default)]
struct RemoteState {
    orders: Vec<Value>,
    lines: Vec<Value>,
    products: HashMap<i64, Value>,
    product_writes: Vec<Value>,
    order_writes: Vec<Value>,
    payments: Vec<Value>,
    order_response: Option<Value>,
    payment_response: Option<Value>,
    fail_orders: bool,
}

type Shared = Arc<Mutex<RemoteState>>;

async fn create_order(State(state): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().await;
    if state.fail_orders {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "database unavailable"})),
        );
    }
    state.orders.push(body);
    let response = state
        .order_response
        .clone()
        .unwrap_or_else(|| json!({"order_id": state.orders.len()}));
    (StatusCode::CREATED, Json(response))
}

/// Answers with every customer's orders, ignoring the filter.
async fn list_orders() -> Json<Value> {
    Json(json!([
        {"id": 1, "customer_id": 4, "order_date": "2025-06-01", "total_amount": 35000,
         "status": "processing", "payment_method": "transfer", "shipping_address": "Jl. A",
         "notes": "leave at door"},
        {"id": 2, "customer_id": "9", "order_date": "2025-06-02T14:00:00+07:00", "total_amount": 15000,
         "status": "shipped", "payment_method": "transfer", "shipping_address": "Jl. B"},
        {"id": 3, "customer_id": 4, "order_date": "2025-06-03 09:30:00", "total_amount": 20000,
         "status": "completed", "payment_method": "transfer", "shipping_address": "Jl. A"}
    ]))
}

async fn replace_order(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> StatusCode {
    let mut state = state.lock().await;
    state.order_writes.push(json!({"id": id, "body": body}));
    StatusCode::OK
}

async fn create_line(State(state): State<Shared>, Json(body): Json<Value>) -> StatusCode {
    state.lock().await.lines.push(body);
    StatusCode::CREATED
}

async fn list_lines(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    if !params.contains_key("order_id") {
        return (StatusCode::BAD_REQUEST, Json(json!({"message": "order_id required"})));
    }
    let mut lines = state.lock().await.lines.clone();
    // Stray line for another order; the client filters it out
    lines.push(json!({"order_id": 999, "product_id": 1, "quantity": 1}));
    (StatusCode::OK, Json(Value::Array(lines)))
}

async fn get_product(State(state): State<Shared>, Path(id): Path<i64>) -> (StatusCode, Json<Value>) {
    match state.lock().await.products.get(&id) {
        Some(product) => (StatusCode::OK, Json(product.clone())),
        None => (StatusCode::NOT_FOUND, Json(json!({"message": "not found"}))),
    }
}

async fn put_product(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> StatusCode {
    let mut state = state.lock().await;
    state.products.insert(id, body.clone());
    state.product_writes.push(body);
    StatusCode::OK
}

async fn create_payment(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let mut state = state.lock().await;
    state.payments.push(body);
    Json(state.payment_response.clone().unwrap_or_else(|| {
        json!({"token": "snap-123", "redirect_url": "https://pay.example.com/snap-123"})
    }))
}

/// Starts the fake on an ephemeral port and returns its base URL.
async fn spawn_remote(state: Shared) -> String {
    let app = Router::new()
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/{id}", axum::routing::put(replace_order))
        .route("/order-lines", post(create_line).get(list_lines))
        .route("/products/{id}", get(get_product).put(put_product))
        .route("/payments", post(create_payment))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/")
}

async fn client_with(state: RemoteState) -> (RestClient, Shared) {
    let shared = Arc::new(Mutex::new(state));
    let base_url = spawn_remote(shared.clone()).await;
    (RestClient::new(base_url, None).unwrap(), shared)
}

fn new_order() -> NewOrder {
    NewOrder {
        customer_id: CustomerId::new(4),
        order_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        total_amount: Money::from_minor(35000),
        status: OrderStatus::Processing,
        payment_method: "transfer".to_string(),
        shipping_address: "Jl. Merdeka 1, Bandung, 40115".to_string(),
    }
}

#[tokio::test]
async fn test_create_order_posts_header_and_reads_order_id() {
    let (client, remote) = client_with(RemoteState::default()).await;

    let order_id = client.create_order(&new_order()).await.unwrap();

    assert_eq!(order_id, OrderId::new(1));
    let remote = remote.lock().await;
    let body = &remote.orders[0];
    assert_eq!(body["customer_id"], 4);
    assert_eq!(body["order_date"], "2025-06-01");
    assert_eq!(body["total_amount"], 35000);
    assert_eq!(body["status"], "processing");
    assert_eq!(body["shipping_address"], "Jl. Merdeka 1, Bandung, 40115");
}

#[tokio::test]
async fn test_create_order_accepts_plain_id() {
    let (client, _remote) = client_with(RemoteState {
        order_response: Some(json!({"id": "17", "message": "created"})),
        ..Default::default()
    })
    .await;

    assert_eq!(
        client.create_order(&new_order()).await.unwrap(),
        OrderId::new(17)
    );
}

#[tokio::test]
async fn test_create_order_without_id_is_an_error() {
    let (client, _remote) = client_with(RemoteState {
        order_response: Some(json!({"message": "created"})),
        ..Default::default()
    })
    .await;

    let result = client.create_order(&new_order()).await;
    assert!(matches!(result, Err(CheckoutError::MissingOrderId)));
}

#[tokio::test]
async fn test_http_error_status_is_reported() {
    let (client, _remote) = client_with(RemoteState {
        fail_orders: true,
        ..Default::default()
    })
    .await;

    match client.create_order(&new_order()).await {
        Err(CheckoutError::Remote { status, body, .. }) => {
            assert_eq!(status, 500);
            assert!(body.contains("database unavailable"));
        }
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_service_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = RestClient::new(format!("http://{addr}"), None).unwrap();

    let result = client.create_order(&new_order()).await;
    assert!(matches!(result, Err(CheckoutError::Http { .. })));
}

#[tokio::test]
async fn test_order_lines_are_posted_and_filtered() {
    let (client, _remote) = client_with(RemoteState::default()).await;
    let line = NewOrderLine {
        order_id: OrderId::new(5),
        product_id: ProductId::new(2),
        quantity: 3,
    };

    client.create_order_line(&line).await.unwrap();
    let lines = client.order_lines(OrderId::new(5)).await.unwrap();

    assert_eq!(lines, vec![line]);
}

#[tokio::test]
async fn test_stock_reconcile_round_trips_full_record() {
    let product = json!({
        "id": 1, "name": "Paracetamol", "unit_price": "10000", "stock": 3,
        "unit": "strip", "supplier": {"code": "SUP-9"}
    });
    let (client, remote) = client_with(RemoteState {
        products: HashMap::from([(1, product.clone())]),
        ..Default::default()
    })
    .await;

    let reconciler = StockReconciler::new(client.clone());
    let adjustment = reconciler.reconcile(ProductId::new(1), 5).await.unwrap();

    assert_eq!(adjustment.new, -2);
    assert!(adjustment.oversold);

    let remote = remote.lock().await;
    let mut expected = product;
    expected["stock"] = json!(-2);
    assert_eq!(remote.product_writes, vec![expected]);
}

#[tokio::test]
async fn test_missing_product_is_remote_error() {
    let (client, _remote) = client_with(RemoteState::default()).await;

    let result = client.fetch_stock(ProductId::new(42)).await;
    assert!(matches!(
        result,
        Err(CheckoutError::Remote { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_payment_session_reads_redirect_and_token() {
    let (client, remote) = client_with(RemoteState::default()).await;
    let request = PaymentRequest {
        external_order_ref: "INV-20250601-1".to_string(),
        amount: Money::from_minor(35000),
        name: "Budi".to_string(),
        email: "budi@example.com".to_string(),
        phone: "0812".to_string(),
        address: "Jl. Merdeka 1".to_string(),
    };

    let session = client.request_session(&request).await.unwrap();

    assert_eq!(session.session_id.as_deref(), Some("snap-123"));
    assert_eq!(
        session.redirect_url.as_deref(),
        Some("https://pay.example.com/snap-123")
    );
    assert_eq!(session.amount.minor(), 35000);
    let remote = remote.lock().await;
    assert_eq!(remote.payments[0]["external_order_ref"], "INV-20250601-1");
    assert_eq!(remote.payments[0]["amount"], 35000);
}

#[tokio::test]
async fn test_empty_redirect_url_means_no_redirect() {
    let (client, _remote) = client_with(RemoteState {
        payment_response: Some(json!({"redirect_url": ""})),
        ..Default::default()
    })
    .await;
    let request = PaymentRequest {
        external_order_ref: "INV-20250601-1".to_string(),
        amount: Money::from_minor(35000),
        name: "Budi".to_string(),
        email: "budi@example.com".to_string(),
        phone: "0812".to_string(),
        address: "Jl. Merdeka 1".to_string(),
    };

    let session = client.request_session(&request).await.unwrap();
    assert!(session.redirect_url.is_none());
    assert!(session.session_id.is_none());
}

#[tokio::test]
async fn test_history_filters_and_cancels_over_http() {
    let (client, remote) = client_with(RemoteState::default()).await;
    let history = OrderHistory::new(client);

    let orders = history.list(CustomerId::new(4)).await.unwrap();
    let ids: Vec<_> = orders.iter().map(|o| o.id.get()).collect();
    assert_eq!(ids, vec![3, 1]);

    let cancelled = history
        .cancel(CustomerId::new(4), OrderId::new(1))
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let remote = remote.lock().await;
    assert_eq!(remote.order_writes.len(), 1);
    let write = &remote.order_writes[0];
    assert_eq!(write["id"], 1);
    assert_eq!(write["body"]["status"], "cancelled");
    assert_eq!(write["body"]["notes"], "leave at door");
}

#[tokio::test]
async fn test_history_reads_datetime_order_dates() {
    let (client, _remote) = client_with(RemoteState::default()).await;

    let orders = client.list_orders(CustomerId::new(4)).await.unwrap();

    let dates: Vec<_> = orders.iter().map(|o| (o.id.get(), o.order_date)).collect();
    assert_eq!(
        dates,
        vec![
            (1, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()),
            (3, NaiveDate::from_ymd_opt(2025, 6, 3).unwrap()),
        ]
    );
}

#[tokio::test]
async fn test_history_refuses_completed_order() {
    let (client, remote) = client_with(RemoteState::default()).await;
    let history = OrderHistory::new(client);

    let result = history.cancel(CustomerId::new(4), OrderId::new(3)).await;

    assert!(matches!(
        result,
        Err(CheckoutError::NotCancellable {
            status: OrderStatus::Completed,
            ..
        })
    ));
    assert!(remote.lock().await.order_writes.is_empty());
}
