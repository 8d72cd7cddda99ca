//! Server API tests

use super::*;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, NaiveDate, Utc};
use http_body_util::BodyExt;
use recur_core::models::{Account, NewSubscription, Subscription, Transaction, User};
use recur_core::provider::RawTransaction;
use recur_core::test_utils::{basiq_account, basiq_transaction, MockBasiqServer};
use recur_core::{
    BankingProvider, BasiqClient, Database, MergeResult, ProviderConfig, Store, SyncConfig,
};
use serde_json::{json, Value};
use tower::ServiceExt;

fn setup_demo_app() -> Router {
    create_router(SyncService::new(None, None), ServerConfig::default())
}

fn days_ago(days: i64) -> String {
    (Utc::now().date_naive() - Duration::days(days)).to_string()
}

/// Mock provider with three monthly Netflix charges and a grocery run
async fn start_mock() -> MockBasiqServer {
    MockBasiqServer::builder()
        .transactions(vec![
            basiq_transaction("nf-1", "Netflix", "-22.99", &days_ago(60)),
            basiq_transaction("nf-2", "Netflix", "-22.99", &days_ago(30)),
            basiq_transaction("nf-3", "Netflix", "-22.99", &days_ago(0)),
            basiq_transaction("co-1", "Coles", "-54.10", &days_ago(3)),
        ])
        .accounts(vec![
            basiq_account("acc-1", "1200.50"),
            basiq_account("acc-2", "300.25"),
        ])
        .page_size(2)
        .start()
        .await
}

/// Live app backed by the mock provider and an in-memory store holding `user-1`
fn setup_live_app(mock: &MockBasiqServer) -> (Router, Database) {
    let client = BasiqClient::new(ProviderConfig::new(mock.url(), "test-key")).unwrap();
    let provider: Arc<dyn BankingProvider> = Arc::new(client);

    let db = Database::in_memory().unwrap();
    db.create_user("user-1").unwrap();
    let store: Arc<dyn Store> = Arc::new(db.clone());

    let service = SyncService::new(Some(provider), Some(store));
    (create_router(service, ServerConfig::default()), db)
}

async fn get_body_json(response: axum::response::Response) -> Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

// ========== Health ==========

#[tokio::test]
async fn test_health_demo() {
    let response = setup_demo_app().oneshot(get("/api/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");

    let json = get_body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["provider"], "demo");
    assert_eq!(json["store"], "none");
}

#[tokio::test]
async fn test_health_live() {
    let mock = start_mock().await;
    let (app, _db) = setup_live_app(&mock);

    let json = get_body_json(app.oneshot(get("/api/health")).await.unwrap()).await;
    assert_eq!(json["provider"], "basiq");
    assert_eq!(json["store"], "sqlite");
}

#[tokio::test]
async fn test_cors_allowed_origins() {
    let config = ServerConfig {
        allowed_origins: vec!["http://localhost:5173".to_string()],
    };
    let app = create_router(SyncService::new(None, None), config);

    let request = |origin: &str| {
        Request::builder()
            .uri("/api/health")
            .header("origin", origin)
            .body(Body::empty())
            .unwrap()
    };

    let allowed = app.clone().oneshot(request("http://localhost:5173")).await.unwrap();
    assert_eq!(
        allowed.headers().get("access-control-allow-origin").unwrap(),
        "http://localhost:5173"
    );

    let other = app.oneshot(request("http://evil.example")).await.unwrap();
    assert!(other.headers().get("access-control-allow-origin").is_none());
}

// ========== Sync ==========

#[tokio::test]
async fn test_sync_demo_mode() {
    let response = setup_demo_app()
        .oneshot(json_request("POST", "/api/sync", json!({ "userId": "anyone" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["mode"], "demo");
    assert_eq!(json["data"]["persisted"], false);
    assert_eq!(json["data"]["transactions"].as_array().unwrap().len(), 73);
    assert_eq!(json["data"]["subscriptions"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_sync_requires_user_id() {
    for body in [json!({}), json!({ "userId": "   " })] {
        let response = setup_demo_app()
            .oneshot(json_request("POST", "/api/sync", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = get_body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "userId is required");
    }
}

#[tokio::test]
async fn test_sync_invalid_json() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/sync")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = setup_demo_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sync_live_detects_and_persists() {
    let mock = start_mock().await;
    let (app, db) = setup_live_app(&mock);

    let response = app
        .oneshot(json_request("POST", "/api/sync", json!({ "userId": "user-1" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["mode"], "live");
    assert_eq!(data["persisted"], true);
    assert_eq!(data["transactionsAdded"], 4);
    assert_eq!(data["subscriptionsDetected"], 1);
    assert_eq!(data["balance"], 1500.75);

    let netflix = &data["subscriptions"][0];
    assert_eq!(netflix["merchantName"], "Netflix");
    assert_eq!(netflix["frequency"], "monthly");
    assert_eq!(netflix["amount"], 22.99);
    let next = (Utc::now().date_naive() + Duration::days(30)).to_string();
    assert_eq!(netflix["nextBillingDate"], next.as_str());

    // Summary covers the last 30 days, newest first
    let ids: Vec<&str> = data["transactions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["externalId"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["nf-3", "co-1", "nf-2"]);

    let user = db.get_user_by_external_id("user-1").unwrap().unwrap();
    assert_eq!(db.count_transactions(user.id).unwrap(), 4);
    assert!(mock.last_filter().unwrap().starts_with("transaction.postDate.bt("));
}

#[tokio::test]
async fn test_sync_provider_failure_is_bad_gateway() {
    let mock = start_mock().await;
    mock.set_failing(true);
    let (app, _db) = setup_live_app(&mock);

    let response = app
        .oneshot(json_request("POST", "/api/sync", json!({ "userId": "user-1" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = get_body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("Banking provider unavailable"));
}

/// Provider that never answers within a test's patience
struct SlowProvider;

#[async_trait]
impl BankingProvider for SlowProvider {
    async fn fetch_transactions(
        &self,
        _user_id: &str,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> recur_core::Result<Vec<RawTransaction>> {
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        Ok(Vec::new())
    }

    async fn fetch_accounts(&self, _user_id: &str) -> recur_core::Result<Vec<Account>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "slow"
    }
}

#[tokio::test]
async fn test_sync_timeout_is_gateway_timeout() {
    let provider: Arc<dyn BankingProvider> = Arc::new(SlowProvider);
    let service = SyncService::new(Some(provider), None).with_sync_config(SyncConfig {
        timeout: std::time::Duration::from_millis(50),
        ..Default::default()
    });
    let app = create_router(service, ServerConfig::default());

    let response = app
        .oneshot(json_request("POST", "/api/sync", json!({ "userId": "user-1" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let json = get_body_json(response).await;
    assert_eq!(json["success"], false);
}

// ========== Subscriptions ==========

#[tokio::test]
async fn test_list_subscriptions_after_sync() {
    let mock = start_mock().await;
    let (app, _db) = setup_live_app(&mock);

    app.clone()
        .oneshot(json_request("POST", "/api/sync", json!({ "userId": "user-1" })))
        .await
        .unwrap();

    let response = app
        .oneshot(get("/api/subscriptions?userId=user-1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["subscriptions"].as_array().unwrap().len(), 1);
    assert_eq!(json["monthlyCost"], 22.99);
}

#[tokio::test]
async fn test_list_subscriptions_requires_user_id() {
    let response = setup_demo_app()
        .oneshot(get("/api/subscriptions"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_subscriptions_unknown_user_is_empty() {
    let mock = start_mock().await;
    let (app, _db) = setup_live_app(&mock);

    let json = get_body_json(
        app.oneshot(get("/api/subscriptions?userId=nobody"))
            .await
            .unwrap(),
    )
    .await;
    assert!(json["subscriptions"].as_array().unwrap().is_empty());
    assert_eq!(json["monthlyCost"], 0.0);
}

#[tokio::test]
async fn test_delete_subscription() {
    let mock = start_mock().await;
    let (app, db) = setup_live_app(&mock);

    let sync = get_body_json(
        app.clone()
            .oneshot(json_request("POST", "/api/sync", json!({ "userId": "user-1" })))
            .await
            .unwrap(),
    )
    .await;
    let id = sync["data"]["subscriptions"][0]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(json_request("DELETE", "/api/subscriptions", json!({ "id": id })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(get_body_json(response).await["success"], true);

    // Soft delete: the row is still there, just inactive
    let stored = db.get_subscription(id).unwrap().unwrap();
    assert!(!stored.is_active);

    let json = get_body_json(
        app.oneshot(get("/api/subscriptions?userId=user-1"))
            .await
            .unwrap(),
    )
    .await;
    assert!(json["subscriptions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_subscription_errors() {
    let mock = start_mock().await;
    let (app, _db) = setup_live_app(&mock);

    let response = app
        .clone()
        .oneshot(json_request("DELETE", "/api/subscriptions", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(json_request("DELETE", "/api/subscriptions", json!({ "id": 9999 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_subscription_without_store_succeeds() {
    let response = setup_demo_app()
        .oneshot(json_request("DELETE", "/api/subscriptions", json!({ "id": 7 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ========== Spend Summary ==========

#[tokio::test]
async fn test_spend_summary_after_sync() {
    let mock = start_mock().await;
    let (app, _db) = setup_live_app(&mock);

    app.clone()
        .oneshot(json_request("POST", "/api/sync", json!({ "userId": "user-1" })))
        .await
        .unwrap();

    let response = app.oneshot(get("/api/summary?userId=user-1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let summary = &json["summary"];
    assert!((summary["expenses"].as_f64().unwrap() - 77.09).abs() < 1e-9);
    assert_eq!(summary["from"], days_ago(14));
    assert_eq!(summary["to"], days_ago(0));
    assert_eq!(summary["previousTotal"], 0.0);
    assert_eq!(summary["subscriptionCount"], 1);
    assert_eq!(summary["subscriptionTotal"], 22.99);
    let breakdown = summary["breakdown"].as_array().unwrap();
    assert_eq!(
        summary["topCategories"].as_array().unwrap().len(),
        breakdown.len().min(3)
    );
    assert!(json["changePercentage"].is_null());
}

#[tokio::test]
async fn test_spend_summary_demo_mode() {
    let response = setup_demo_app()
        .oneshot(get("/api/summary?userId=anyone"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["summary"]["subscriptionCount"], 3);
    assert!(json["summary"]["expenses"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_spend_summary_requires_user_id() {
    let response = setup_demo_app().oneshot(get("/api/summary")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// A store that is always down
struct DownStore;

impl Store for DownStore {
    fn find_user_by_external_id(&self, _: &str) -> recur_core::Result<Option<User>> {
        Err(recur_core::Error::StorageUnavailable("connection refused".into()))
    }
    fn merge_transactions(&self, _: i64, _: &[Transaction]) -> recur_core::Result<MergeResult> {
        Err(recur_core::Error::StorageUnavailable("connection refused".into()))
    }
    fn list_transactions_between(
        &self,
        _: i64,
        _: NaiveDate,
        _: NaiveDate,
    ) -> recur_core::Result<Vec<Transaction>> {
        Err(recur_core::Error::StorageUnavailable("connection refused".into()))
    }
    fn list_active_subscriptions(&self, _: i64) -> recur_core::Result<Vec<Subscription>> {
        Err(recur_core::Error::StorageUnavailable("connection refused".into()))
    }
    fn upsert_subscription(&self, _: &NewSubscription) -> recur_core::Result<i64> {
        Err(recur_core::Error::StorageUnavailable("connection refused".into()))
    }
    fn deactivate_subscription(&self, _: i64) -> recur_core::Result<bool> {
        Err(recur_core::Error::StorageUnavailable("connection refused".into()))
    }
    fn update_last_sync(&self, _: i64, _: chrono::DateTime<Utc>) -> recur_core::Result<()> {
        Err(recur_core::Error::StorageUnavailable("connection refused".into()))
    }
}

#[tokio::test]
async fn test_storage_failure_is_service_unavailable() {
    let mock = start_mock().await;
    let client = BasiqClient::new(ProviderConfig::new(mock.url(), "test-key")).unwrap();
    let provider: Arc<dyn BankingProvider> = Arc::new(client);
    let store: Arc<dyn Store> = Arc::new(DownStore);
    let app = create_router(
        SyncService::new(Some(provider), Some(store)),
        ServerConfig::default(),
    );

    for uri in ["/api/subscriptions?userId=user-1", "/api/summary?userId=user-1"] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE, "{}", uri);

        let json = get_body_json(response).await;
        assert_eq!(json["success"], false);
        // Backend details stay in the logs
        assert_eq!(json["error"], "Storage unavailable");
    }

    // A sync still succeeds, it just isn't persisted
    let response = app
        .oneshot(json_request("POST", "/api/sync", json!({ "userId": "user-1" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(get_body_json(response).await["data"]["persisted"], false);
}

// ========== Transactions & Accounts ==========

#[tokio::test]
async fn test_transactions_require_provider() {
    let response = setup_demo_app()
        .oneshot(get("/api/transactions?userId=user-1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = setup_demo_app()
        .oneshot(get("/api/accounts?userId=user-1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_list_transactions_with_explicit_range() {
    let mock = start_mock().await;
    let (app, _db) = setup_live_app(&mock);

    let response = app
        .oneshot(get(
            "/api/transactions?userId=user-1&from=2024-01-01&to=2024-01-31",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["from"], "2024-01-01");
    assert_eq!(json["to"], "2024-01-31");
    // The mock ignores the window and serves everything
    assert_eq!(json["count"], 4);
    assert_eq!(json["transactions"][0]["externalId"], "nf-3");
    assert_eq!(
        mock.last_filter().unwrap(),
        "transaction.postDate.bt('2024-01-01','2024-01-31')"
    );
}

#[tokio::test]
async fn test_list_transactions_default_range() {
    let mock = start_mock().await;
    let (app, _db) = setup_live_app(&mock);

    let json = get_body_json(
        app.oneshot(get("/api/transactions?userId=user-1"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(json["to"], days_ago(0).as_str());
    assert_eq!(json["from"], days_ago(30).as_str());
}

#[tokio::test]
async fn test_list_transactions_inverted_range() {
    let mock = start_mock().await;
    let (app, _db) = setup_live_app(&mock);

    let response = app
        .oneshot(get(
            "/api/transactions?userId=user-1&from=2024-02-01&to=2024-01-01",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_accounts() {
    let mock = start_mock().await;
    let (app, _db) = setup_live_app(&mock);

    let response = app
        .oneshot(get("/api/accounts?userId=user-1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["accounts"].as_array().unwrap().len(), 2);
    assert_eq!(json["accounts"][0]["id"], "acc-1");
    assert_eq!(json["totalBalance"], 1500.75);
}
