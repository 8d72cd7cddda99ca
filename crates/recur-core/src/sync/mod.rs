//! Sync orchestration
//!
//! One sync runs: fetch (transactions and balance, concurrently), normalize,
//! reconcile against the store, detect subscriptions, persist, summarize.
//!
//! Operating modes:
//! - no provider: deterministic demo data
//! - provider, no store (or unknown user): detection over fetched data only
//! - provider and store: full reconciliation
//!
//! Storage trouble never fails a sync. If the transaction merge did not
//! commit, the summary is built from the fetched data with `persisted = false`.
//! Once it has committed, later storage failures are logged and skipped.

mod demo;

pub use demo::{demo_subscriptions, demo_summary, demo_transactions};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::detect::{DetectionConfig, SubscriptionDetector};
use crate::error::{Error, Result};
use crate::models::{merchant_key, Account, Subscription, SyncMode, SyncSummary, Transaction};
use crate::normalize::normalize_all;
use crate::provider::BankingProvider;
use crate::store::Store;
use crate::summary::{spend_summary, SpendSummary, SPEND_WINDOW_DAYS};

/// What reconciliation produced when storage was available
struct Reconciled {
    transactions: Vec<Transaction>,
    existing: Vec<Subscription>,
    detected: Vec<Subscription>,
    inserted: usize,
}

/// Coordinates provider, store and detector for a sync
pub struct SyncService {
    provider: Option<Arc<dyn BankingProvider>>,
    store: Option<Arc<dyn Store>>,
    detector: SubscriptionDetector,
    config: SyncConfig,
}

impl SyncService {
    pub fn new(provider: Option<Arc<dyn BankingProvider>>, store: Option<Arc<dyn Store>>) -> Self {
        Self {
            provider,
            store,
            detector: SubscriptionDetector::new(),
            config: SyncConfig::default(),
        }
    }

    pub fn with_sync_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_detection_config(mut self, config: DetectionConfig) -> Self {
        self.detector = SubscriptionDetector::with_config(config);
        self
    }

    /// Whether a live banking provider is configured
    pub fn is_live(&self) -> bool {
        self.provider.is_some()
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    pub fn provider_name(&self) -> Option<&str> {
        self.provider.as_deref().map(|p| p.name())
    }

    pub fn store_name(&self) -> Option<&str> {
        self.store.as_deref().map(|s| s.name())
    }

    pub fn sync_config(&self) -> &SyncConfig {
        &self.config
    }

    /// Sync a provider user now
    pub async fn sync(&self, user_external_id: &str) -> Result<SyncSummary> {
        self.sync_at(user_external_id, Utc::now()).await
    }

    /// Sync a provider user against a fixed clock
    pub async fn sync_at(&self, user_external_id: &str, now: DateTime<Utc>) -> Result<SyncSummary> {
        let user_external_id = user_external_id.trim();
        if user_external_id.is_empty() {
            return Err(Error::InvalidData("user id is required".into()));
        }

        let Some(provider) = self.provider.as_ref() else {
            info!(user = %user_external_id, "No banking provider configured, serving demo data");
            return Ok(demo_summary(now));
        };

        let today = now.date_naive();
        let from = today - Duration::days(self.config.history_days);

        let (raw, balance) = tokio::try_join!(
            provider.fetch_transactions(user_external_id, from, today),
            provider.total_balance(user_external_id),
        )?;
        let fetched = normalize_all(&raw);
        info!(
            user = %user_external_id,
            fetched = raw.len(),
            normalized = fetched.len(),
            "Fetched transactions"
        );

        let reconciled = match self.store.as_deref() {
            Some(store) => match self.reconcile(store, user_external_id, &fetched, from, today, now) {
                Ok(r) => r,
                Err(e) => {
                    warn!(
                        user = %user_external_id,
                        error = %e,
                        "Storage unavailable, continuing without persistence"
                    );
                    None
                }
            },
            None => None,
        };

        let persisted = reconciled.is_some();
        let (transactions, subscriptions, detected_count, added) = match reconciled {
            Some(r) => {
                let detected_count = r.detected.len();
                let mut subscriptions = r.existing;
                subscriptions.extend(r.detected);
                (r.transactions, subscriptions, detected_count, r.inserted)
            }
            None => {
                let detected: Vec<Subscription> = self
                    .detector
                    .detect(&fetched, &[])
                    .iter()
                    .map(|d| d.to_subscription(None, now))
                    .collect();
                let detected_count = detected.len();
                let added = fetched.len();
                (fetched, detected, detected_count, added)
            }
        };

        let summary_from = today - Duration::days(self.config.summary_days);
        let mut recent: Vec<Transaction> = transactions
            .into_iter()
            .filter(|t| t.date >= summary_from)
            .collect();
        recent.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.external_id.cmp(&b.external_id)));

        info!(
            user = %user_external_id,
            added,
            detected = detected_count,
            persisted,
            "Sync complete"
        );

        Ok(SyncSummary {
            transactions: recent,
            subscriptions,
            balance,
            transactions_added: added,
            subscriptions_detected: detected_count,
            last_sync_at: now,
            mode: SyncMode::Live,
            persisted,
        })
    }

    /// Merge, re-read, detect and persist; `None` when the user isn't known locally
    ///
    /// Errors before the merge commits mean nothing was written and are
    /// returned. After the merge, a failing step is logged and the summary is
    /// built from whatever did succeed.
    fn reconcile(
        &self,
        store: &dyn Store,
        user_external_id: &str,
        fetched: &[Transaction],
        from: NaiveDate,
        to: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Option<Reconciled>> {
        let Some(user) = store.find_user_by_external_id(user_external_id)? else {
            debug!(user = %user_external_id, "No local user, skipping persistence");
            return Ok(None);
        };

        let merge = store.merge_transactions(user.id, fetched)?;
        debug!(inserted = merge.inserted, updated = merge.updated, "Merged transactions");

        let transactions = store
            .list_transactions_between(user.id, from, to)
            .unwrap_or_else(|e| {
                warn!(user = %user_external_id, error = %e, "Re-read failed, detecting over fetched data");
                fetched.to_vec()
            });

        // Without the tracked list there is no safe way to tell new from known
        let (existing, mut writable) = match store.list_active_subscriptions(user.id) {
            Ok(existing) => (existing, true),
            Err(e) => {
                warn!(user = %user_external_id, error = %e, "Could not list subscriptions, detections not saved");
                (Vec::new(), false)
            }
        };

        let mut detected = Vec::new();
        for result in self.detector.detect(&transactions, &existing) {
            // Never a second active row for a tracked merchant
            let key = merchant_key(&result.merchant_name);
            if existing.iter().any(|s| merchant_key(&s.merchant_name) == key) {
                continue;
            }

            let mut sub = result.to_subscription(Some(user.id), now);
            if writable {
                match store.upsert_subscription(&result.to_new_subscription(user.id)) {
                    Ok(id) => sub.id = Some(id),
                    Err(e) => {
                        warn!(
                            user = %user_external_id,
                            merchant = %result.merchant_name,
                            error = %e,
                            "Failed to save subscription, remaining detections not saved"
                        );
                        writable = false;
                    }
                }
            }
            detected.push(sub);
        }

        if let Err(e) = store.update_last_sync(user.id, now) {
            warn!(user = %user_external_id, error = %e, "Failed to record sync time");
        }

        Ok(Some(Reconciled {
            transactions,
            existing,
            detected,
            inserted: merge.inserted,
        }))
    }

    /// Normalized provider transactions for `[from, to]`, most recent first
    pub async fn fetch_transactions(
        &self,
        user_external_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        let provider = self.require_provider()?;
        if from > to {
            return Err(Error::InvalidData(format!(
                "invalid range: {} is after {}",
                from, to
            )));
        }
        let raw = provider.fetch_transactions(user_external_id, from, to).await?;
        let mut transactions = normalize_all(&raw);
        transactions.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(transactions)
    }

    pub async fn fetch_accounts(&self, user_external_id: &str) -> Result<Vec<Account>> {
        self.require_provider()?.fetch_accounts(user_external_id).await
    }

    /// Active subscriptions for a local user; empty when the user is unknown
    pub fn list_subscriptions(&self, user_external_id: &str) -> Result<Vec<Subscription>> {
        let Some(store) = self.store.as_deref() else {
            return Ok(Vec::new());
        };
        match store.find_user_by_external_id(user_external_id.trim())? {
            Some(user) => store.list_active_subscriptions(user.id),
            None => Ok(Vec::new()),
        }
    }

    /// Spend summary for the window ending today
    pub fn spend_summary(&self, user_external_id: &str) -> Result<SpendSummary> {
        self.spend_summary_at(user_external_id, Utc::now())
    }

    /// Spend summary over stored transactions for the window ending on `now`
    ///
    /// Without a provider nothing is ever stored, so the summary covers the
    /// demo data instead. An unknown user or a missing store gives an empty
    /// summary.
    pub fn spend_summary_at(&self, user_external_id: &str, now: DateTime<Utc>) -> Result<SpendSummary> {
        let user_external_id = user_external_id.trim();
        if user_external_id.is_empty() {
            return Err(Error::InvalidData("user id is required".into()));
        }
        let today = now.date_naive();

        if self.provider.is_none() {
            return Ok(spend_summary(
                &demo_transactions(now),
                &demo_subscriptions(now),
                today,
                SPEND_WINDOW_DAYS,
            ));
        }

        let stored_user = match self.store.as_deref() {
            Some(store) => store
                .find_user_by_external_id(user_external_id)?
                .map(|user| (store, user)),
            None => None,
        };
        let Some((store, user)) = stored_user else {
            debug!(user = %user_external_id, "No stored data, empty spend summary");
            return Ok(spend_summary(&[], &[], today, SPEND_WINDOW_DAYS));
        };

        let from = today - Duration::days(2 * SPEND_WINDOW_DAYS);
        let transactions = store.list_transactions_between(user.id, from, today)?;
        let subscriptions = store.list_active_subscriptions(user.id)?;
        Ok(spend_summary(&transactions, &subscriptions, today, SPEND_WINDOW_DAYS))
    }

    /// Soft delete a subscription
    ///
    /// Without a store there is nothing to remove and this succeeds.
    pub fn remove_subscription(&self, id: i64) -> Result<()> {
        let Some(store) = self.store.as_deref() else {
            debug!(id, "No store configured, nothing to remove");
            return Ok(());
        };
        if store.deactivate_subscription(id)? {
            info!(id, "Subscription removed");
            Ok(())
        } else {
            Err(Error::NotFound(format!("subscription {}", id)))
        }
    }

    fn require_provider(&self) -> Result<&Arc<dyn BankingProvider>> {
        self.provider
            .as_ref()
            .ok_or_else(|| Error::ProviderUnavailable("no banking provider configured".into()))
    }
}
