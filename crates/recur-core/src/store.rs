//! Persistence seam used by the sync orchestrator
//!
//! The orchestrator only ever talks to storage through [`Store`], so a sync
//! can run against SQLite, an in-test double, or nothing at all.

use chrono::{DateTime, NaiveDate, Utc};

use crate::db::{Database, MergeResult};
use crate::error::Result;
use crate::models::{NewSubscription, Subscription, Transaction, User};

/// Keyed storage for users, transactions and subscriptions
pub trait Store: Send + Sync {
    fn find_user_by_external_id(&self, external_id: &str) -> Result<Option<User>>;

    /// Idempotent upsert keyed on (user, external id)
    fn merge_transactions(&self, user_id: i64, transactions: &[Transaction]) -> Result<MergeResult>;

    fn list_transactions_between(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Transaction>>;

    /// Active subscriptions ordered by amount, highest first
    fn list_active_subscriptions(&self, user_id: i64) -> Result<Vec<Subscription>>;

    fn upsert_subscription(&self, subscription: &NewSubscription) -> Result<i64>;

    /// Soft delete; false when the id is unknown
    fn deactivate_subscription(&self, id: i64) -> Result<bool>;

    fn update_last_sync(&self, user_id: i64, at: DateTime<Utc>) -> Result<()>;

    /// Name used in logs and health output
    fn name(&self) -> &str {
        "store"
    }
}

impl Store for Database {
    fn find_user_by_external_id(&self, external_id: &str) -> Result<Option<User>> {
        self.get_user_by_external_id(external_id)
    }

    fn merge_transactions(&self, user_id: i64, transactions: &[Transaction]) -> Result<MergeResult> {
        Database::merge_transactions(self, user_id, transactions)
    }

    fn list_transactions_between(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        Database::list_transactions_between(self, user_id, from, to)
    }

    fn list_active_subscriptions(&self, user_id: i64) -> Result<Vec<Subscription>> {
        Database::list_active_subscriptions(self, user_id)
    }

    fn upsert_subscription(&self, subscription: &NewSubscription) -> Result<i64> {
        Database::upsert_subscription(self, subscription)
    }

    fn deactivate_subscription(&self, id: i64) -> Result<bool> {
        Database::deactivate_subscription(self, id)
    }

    fn update_last_sync(&self, user_id: i64, at: DateTime<Utc>) -> Result<()> {
        self.set_last_sync(user_id, at)
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}
