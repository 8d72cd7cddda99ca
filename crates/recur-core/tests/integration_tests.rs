//! Integration tests for recur-core
//!
//! These tests exercise the full fetch → normalize → reconcile → detect
//! workflow through the public API.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::sync::Arc;

use recur_core::{
    models::{Frequency, SyncMode, TransactionType},
    monthly_cost,
    provider::RawTransaction,
    BankingProvider, Database, Error, StaticProvider, Store, SyncService,
};

fn clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
}

/// Provider payload with monthly Netflix and Spotify charges, a weekly
/// newspaper, irregular grocery runs and salary credits
fn provider_payload() -> &'static str {
    r#"[
        {"id":"n1","description":"NETFLIX.COM","amount":"-22.99","direction":"debit","postDate":"2024-04-01T00:00:00Z","enrich":{"merchant":{"businessName":"Netflix"}}},
        {"id":"n2","description":"NETFLIX.COM","amount":"-22.99","direction":"debit","postDate":"2024-05-01T00:00:00Z","enrich":{"merchant":{"businessName":"Netflix"}}},
        {"id":"n3","description":"NETFLIX.COM","amount":"-22.99","direction":"debit","postDate":"2024-05-31T00:00:00Z","enrich":{"merchant":{"businessName":"Netflix"}}},
        {"id":"n4","description":"NETFLIX.COM","amount":"-22.99","direction":"debit","postDate":"2024-06-30T00:00:00Z","enrich":{"merchant":{"businessName":"Netflix"}}},
        {"id":"s1","description":"Spotify P0A1B2","amount":"-11.99","direction":"debit","postDate":"2024-05-20T00:00:00Z","enrich":{"merchant":{"businessName":"Spotify"}}},
        {"id":"s2","description":"Spotify P0A1B2","amount":"-11.99","direction":"debit","postDate":"2024-06-19T00:00:00Z","enrich":{"merchant":{"businessName":"Spotify"}}},
        {"id":"p1","description":"The Daily Paper","amount":"-4.50","direction":"debit","postDate":"2024-06-02T00:00:00Z"},
        {"id":"p2","description":"The Daily Paper","amount":"-4.50","direction":"debit","postDate":"2024-06-09T00:00:00Z"},
        {"id":"p3","description":"The Daily Paper","amount":"-4.50","direction":"debit","postDate":"2024-06-16T00:00:00Z"},
        {"id":"w1","description":"WOOLWORTHS 1234","amount":"-87.10","direction":"debit","postDate":"2024-06-03T00:00:00Z","enrich":{"merchant":{"businessName":"Woolworths"},"category":{"anzsic":{"division":{"title":"Retail Trade"}}}}},
        {"id":"w2","description":"WOOLWORTHS 1234","amount":"-142.35","direction":"debit","postDate":"2024-06-12T00:00:00Z","enrich":{"merchant":{"businessName":"Woolworths"},"category":{"anzsic":{"division":{"title":"Retail Trade"}}}}},
        {"id":"i1","description":"ACME PTY LTD SALARY","amount":"4200.00","direction":"credit","postDate":"2024-05-28T00:00:00Z"},
        {"id":"i2","description":"ACME PTY LTD SALARY","amount":"4200.00","direction":"credit","postDate":"2024-06-27T00:00:00Z"},
        {"id":"t1","description":"Transfer from savings","amount":"500.00","direction":"credit","postDate":"2024-06-05T00:00:00Z"},
        {"id":"bad","description":"Corrupt record","amount":"n/a","postDate":"2024-06-06T00:00:00Z"}
    ]"#
}

fn provider() -> Arc<dyn BankingProvider> {
    let raw: Vec<RawTransaction> = serde_json::from_str(provider_payload()).unwrap();
    Arc::new(StaticProvider::new(raw).with_accounts(vec![recur_core::models::Account {
        balance: 3120.40,
        ..StaticProvider::account("acc-1")
    }]))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_full_sync_workflow() {
    let db = Arc::new(Database::in_memory().expect("Failed to create in-memory database"));
    let user = db.create_user("basiq-123").unwrap();
    let store: Arc<dyn Store> = db.clone();
    let service = SyncService::new(Some(provider()), Some(store));

    let summary = service.sync_at("basiq-123", clock()).await.unwrap();

    assert_eq!(summary.mode, SyncMode::Live);
    assert!(summary.persisted);
    // The corrupt record is skipped, everything else is stored
    assert_eq!(summary.transactions_added, 14);
    assert_eq!(db.count_transactions(user.id).unwrap(), 14);

    let names: Vec<&str> = summary
        .subscriptions
        .iter()
        .map(|s| s.merchant_name.as_str())
        .collect();
    assert_eq!(names, vec!["Netflix", "Spotify", "The Daily Paper"]);
    assert_eq!(summary.subscriptions_detected, 3);

    let paper = &summary.subscriptions[2];
    assert_eq!(paper.frequency, Frequency::Weekly);
    assert_eq!(paper.next_billing_date, date(2024, 6, 23));

    // Transfers and income are never subscriptions
    assert!(summary
        .transactions
        .iter()
        .any(|t| t.transaction_type == TransactionType::Transfer));

    let monthly = monthly_cost(&summary.subscriptions);
    assert!((monthly - (22.99 + 11.99 + 4.50 * 4.33)).abs() < 1e-9);
}

#[tokio::test]
async fn test_repeated_syncs_converge() {
    let db = Arc::new(Database::in_memory().unwrap());
    let user = db.create_user("basiq-123").unwrap();
    let store: Arc<dyn Store> = db.clone();
    let service = SyncService::new(Some(provider()), Some(store));

    for _ in 0..3 {
        service.sync_at("basiq-123", clock()).await.unwrap();
    }
    let last = service.sync_at("basiq-123", clock()).await.unwrap();

    assert_eq!(last.transactions_added, 0);
    assert_eq!(last.subscriptions_detected, 0);
    assert_eq!(last.subscriptions.len(), 3);
    assert_eq!(db.count_transactions(user.id).unwrap(), 14);
    assert_eq!(db.list_active_subscriptions(user.id).unwrap().len(), 3);
}

#[tokio::test]
async fn test_removed_subscription_is_redetected_as_new() {
    let db = Arc::new(Database::in_memory().unwrap());
    let user = db.create_user("basiq-123").unwrap();
    let store: Arc<dyn Store> = db.clone();
    let service = SyncService::new(Some(provider()), Some(store));

    let first = service.sync_at("basiq-123", clock()).await.unwrap();
    let netflix_id = first.subscriptions[0].id.unwrap();
    service.remove_subscription(netflix_id).unwrap();
    assert_eq!(service.list_subscriptions("basiq-123").unwrap().len(), 2);

    // Soft-deleted rows stay, a fresh detection creates a new active row
    let second = service.sync_at("basiq-123", clock()).await.unwrap();
    assert_eq!(second.subscriptions_detected, 1);
    assert_ne!(second.subscriptions.last().unwrap().id, Some(netflix_id));
    assert!(db.get_subscription(netflix_id).unwrap().is_some());
    assert_eq!(db.list_active_subscriptions(user.id).unwrap().len(), 3);
}

#[tokio::test]
async fn test_demo_mode_is_deterministic() {
    let service = SyncService::new(None, None);
    let a = service.sync_at("demo-user", clock()).await.unwrap();
    let b = service.sync_at("demo-user", clock()).await.unwrap();

    assert_eq!(a.mode, SyncMode::Demo);
    assert_eq!(a.transactions, b.transactions);
    assert_eq!(a.balance, b.balance);
    assert_eq!(a.subscriptions.len(), 3);
    assert!(monthly_cost(&a.subscriptions) > 0.0);
}

#[tokio::test]
async fn test_provider_outage_has_no_demo_fallback() {
    let failing: Arc<dyn BankingProvider> = Arc::new(StaticProvider::failing());
    let service = SyncService::new(Some(failing), None);

    match service.sync_at("basiq-123", clock()).await {
        Err(Error::ProviderUnavailable(_)) => {}
        other => panic!("expected ProviderUnavailable, got {:?}", other.map(|s| s.mode)),
    }
}
