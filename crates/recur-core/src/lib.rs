//! Recur Core Library
//!
//! Shared functionality for recur, the bank sync and subscription tracker:
//! - Transaction normalization from banking provider records
//! - Idempotent reconciliation into a local SQLite store
//! - Recurring payment (subscription) detection with confidence scores
//! - Sync orchestration with demo and degraded-storage modes
//! - Monthly cost aggregation and spend summaries
//! - Banking provider client (Basiq) with token caching

pub mod config;
pub mod cost;
pub mod db;
pub mod detect;
pub mod error;
pub mod models;
pub mod normalize;
pub mod provider;
pub mod store;
pub mod summary;
pub mod sync;

/// Test utilities including a mock Basiq server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{ProviderConfig, RecurConfig, ServerSettings, SyncConfig};
pub use cost::monthly_cost;
pub use db::{Database, MergeResult};
pub use detect::{detect_subscriptions, DetectionConfig, SubscriptionDetector};
pub use error::{Error, Result};
pub use normalize::{categorize, classify_type, normalize, normalize_all};
pub use provider::{BankingProvider, BasiqClient, StaticProvider, TokenCache};
pub use store::Store;
pub use summary::{spend_summary, CategorySpend, SpendSummary, SPEND_WINDOW_DAYS};
pub use sync::SyncService;
