//! Test utilities for recur-core
//!
//! Provides a mock Basiq server that speaks enough of the real API for
//! client and end-to-end sync tests: server tokens, paginated transaction
//! listings and accounts.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// Mock Basiq server for testing
pub struct MockBasiqServer {
    addr: SocketAddr,
    state: Arc<MockState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

/// Configures the data a [`MockBasiqServer`] serves
#[derive(Default)]
pub struct MockBasiqServerBuilder {
    transactions: Vec<Value>,
    accounts: Vec<Value>,
    page_size: Option<usize>,
}

impl MockBasiqServerBuilder {
    pub fn transactions(mut self, transactions: Vec<Value>) -> Self {
        self.transactions = transactions;
        self
    }

    pub fn accounts(mut self, accounts: Vec<Value>) -> Self {
        self.accounts = accounts;
        self
    }

    /// Split transaction listings into pages of this size
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size.max(1));
        self
    }

    /// Start the mock server on an available port
    pub async fn start(self) -> MockBasiqServer {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let state = Arc::new(MockState {
            base_url: format!("http://{}", addr),
            transactions: self.transactions,
            accounts: self.accounts,
            page_size: self.page_size.unwrap_or(500),
            token_requests: AtomicUsize::new(0),
            valid_token: Mutex::new(None),
            failing: AtomicBool::new(false),
            last_filter: Mutex::new(None),
        });

        let app = Router::new()
            .route("/token", post(handle_token))
            .route("/users/:user_id/transactions", get(handle_transactions))
            .route("/users/:user_id/accounts", get(handle_accounts))
            .with_state(state.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        MockBasiqServer {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }
}

impl MockBasiqServer {
    pub fn builder() -> MockBasiqServerBuilder {
        MockBasiqServerBuilder::default()
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of `POST /token` calls received, including rejected ones
    pub fn token_requests(&self) -> usize {
        self.state.token_requests.load(Ordering::SeqCst)
    }

    /// Reject every token issued so far with 401
    pub fn revoke_tokens(&self) {
        *self.state.valid_token.lock().unwrap() = None;
    }

    /// Make data endpoints answer 503
    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    /// The `filter` query parameter of the most recent transaction listing
    pub fn last_filter(&self) -> Option<String> {
        self.state.last_filter.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockBasiqServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A provider transaction in Basiq's JSON shape
pub fn basiq_transaction(id: &str, merchant: &str, amount: &str, post_date: &str) -> Value {
    let direction = if amount.trim_start().starts_with('-') {
        "debit"
    } else {
        "credit"
    };
    json!({
        "type": "transaction",
        "id": id,
        "status": "posted",
        "description": merchant.to_uppercase(),
        "amount": amount,
        "account": "acc-1",
        "direction": direction,
        "class": "payment",
        "postDate": format!("{}T00:00:00Z", post_date),
        "transactionDate": null,
        "enrich": {
            "merchant": { "businessName": merchant },
            "category": { "anzsic": { "division": { "title": "Information Media and Telecommunications" } } }
        }
    })
}

/// A provider account in Basiq's JSON shape
pub fn basiq_account(id: &str, balance: &str) -> Value {
    json!({
        "type": "account",
        "id": id,
        "name": "Everyday Account",
        "accountNo": "062000 12345678",
        "balance": balance,
        "availableFunds": balance,
        "class": { "type": "transaction", "product": "Everyday" },
        "status": "available",
        "institution": "AU00000"
    })
}

struct MockState {
    base_url: String,
    transactions: Vec<Value>,
    accounts: Vec<Value>,
    page_size: usize,
    token_requests: AtomicUsize,
    valid_token: Mutex<Option<String>>,
    failing: AtomicBool,
    last_filter: Mutex<Option<String>>,
}

impl MockState {
    /// Ok when the request carries the current bearer token
    fn authorize(&self, headers: &HeaderMap) -> Result<(), Response> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StatusCode::SERVICE_UNAVAILABLE.into_response());
        }
        if headers.get("basiq-version").and_then(|v| v.to_str().ok()) != Some("3.0") {
            return Err(StatusCode::BAD_REQUEST.into_response());
        }

        let presented = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        let valid = self.valid_token.lock().unwrap().clone();

        match (presented, valid) {
            (Some(p), Some(v)) if p == v => Ok(()),
            _ => Err(StatusCode::UNAUTHORIZED.into_response()),
        }
    }
}

async fn handle_token(State(state): State<Arc<MockState>>, headers: HeaderMap, body: String) -> Response {
    let n = state.token_requests.fetch_add(1, Ordering::SeqCst) + 1;

    let key = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
        .map(str::trim)
        .unwrap_or("");
    if key.is_empty() || body != "scope=SERVER_ACCESS" {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "type": "list", "data": [{ "code": "unauthorized-access" }] })),
        )
            .into_response();
    }

    let token = format!("mock-token-{}", n);
    *state.valid_token.lock().unwrap() = Some(token.clone());

    Json(json!({
        "access_token": token,
        "token_type": "Bearer",
        "expires_in": 3600
    }))
    .into_response()
}

#[derive(Debug, Deserialize)]
struct ListingQuery {
    filter: Option<String>,
    page: Option<usize>,
}

async fn handle_transactions(
    State(state): State<Arc<MockState>>,
    Path(user_id): Path<String>,
    Query(query): Query<ListingQuery>,
    headers: HeaderMap,
) -> Response {
    if let Err(rejection) = state.authorize(&headers) {
        return rejection;
    }
    if let Some(filter) = query.filter {
        *state.last_filter.lock().unwrap() = Some(filter);
    }

    let page = query.page.unwrap_or(0);
    let start = page * state.page_size;
    let data: Vec<Value> = state
        .transactions
        .iter()
        .skip(start)
        .take(state.page_size)
        .cloned()
        .collect();

    let next = (start + state.page_size < state.transactions.len()).then(|| {
        format!(
            "{}/users/{}/transactions?page={}",
            state.base_url,
            user_id,
            page + 1
        )
    });

    Json(json!({
        "type": "list",
        "count": data.len(),
        "data": data,
        "links": { "self": format!("{}/users/{}/transactions", state.base_url, user_id), "next": next }
    }))
    .into_response()
}

async fn handle_accounts(
    State(state): State<Arc<MockState>>,
    Path(_user_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(rejection) = state.authorize(&headers) {
        return rejection;
    }
    Json(json!({ "type": "list", "data": state.accounts })).into_response()
}
