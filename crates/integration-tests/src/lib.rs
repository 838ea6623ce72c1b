//! Integration tests for RocketShoes.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocketshoes-integration-tests
//! ```
//!
//! No external services are needed: [`TestApi`] serves the stock and
//! catalog endpoints from an in-process `axum` router on a random local
//! port, and carts are persisted to temporary directories.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

#[derive(Default)]
struct ApiState {
    stock: Mutex<HashMap<i64, u32>>,
    products: Mutex<HashMap<i64, Value>>,
    failing: Mutex<HashSet<i64>>,
    authorization: Mutex<Option<String>>,
    product_requests: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process stand-in for the stock and catalog API.
///
/// Serves `GET /stock/{id}` and `GET /products/{id}`. Unknown IDs return 404;
/// IDs marked with [`TestApi::fail`] return 500 on both endpoints.
pub struct TestApi {
    addr: SocketAddr,
    state: Arc<ApiState>,
    server: JoinHandle<()>,
}

impl TestApi {
    /// Bind to `127.0.0.1:0` and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn() -> Self {
        let state = Arc::new(ApiState::default());

        let app = Router::new()
            .route("/stock/{id}", get(stock))
            .route("/products/{id}", get(product))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test API listener");
        let addr = listener
            .local_addr()
            .expect("Failed to read test API address");

        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            server,
        }
    }

    /// Base URL to point the API client at.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Set the available stock for a product.
    pub fn set_stock(&self, id: i64, amount: u32) {
        lock(&self.state.stock).insert(id, amount);
    }

    /// Register a catalog product; its `id` field is used as the key.
    pub fn add_product(&self, product: Value) {
        if let Some(id) = product.get("id").and_then(Value::as_i64) {
            lock(&self.state.products).insert(id, product);
        }
    }

    /// Register a product with stock in one call.
    pub fn stock_product(&self, id: i64, title: &str, price: f64, amount: u32) {
        self.add_product(json!({
            "id": id,
            "title": title,
            "price": price,
            "image": format!("https://cdn.rocketshoes.test/{id}.jpg"),
        }));
        self.set_stock(id, amount);
    }

    /// Make both endpoints return 500 for a product.
    pub fn fail(&self, id: i64) {
        lock(&self.state.failing).insert(id);
    }

    /// Number of `GET /products/{id}` requests served so far.
    #[must_use]
    pub fn product_requests(&self) -> usize {
        self.state.product_requests.load(Ordering::SeqCst)
    }

    /// `Authorization` header of the most recent request, if any.
    #[must_use]
    pub fn last_authorization(&self) -> Option<String> {
        lock(&self.state.authorization).clone()
    }
}

impl Drop for TestApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn record_authorization(state: &ApiState, headers: &HeaderMap) {
    *lock(&state.authorization) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
}

async fn stock(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    record_authorization(&state, &headers);

    if lock(&state.failing).contains(&id) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "stock service exploded").into_response();
    }

    let amount = lock(&state.stock).get(&id).copied();
    match amount {
        Some(amount) => Json(json!({ "id": id, "amount": amount })).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn product(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    record_authorization(&state, &headers);
    state.product_requests.fetch_add(1, Ordering::SeqCst);

    if lock(&state.failing).contains(&id) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "catalog exploded").into_response();
    }

    let product = lock(&state.products).get(&id).cloned();
    match product {
        Some(product) => Json(product).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
