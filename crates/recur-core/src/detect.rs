//! Subscription detection
//!
//! Finds recurring charges in a transaction history:
//! - groups expenses by merchant
//! - requires stable amounts and a regular billing interval
//! - scores each candidate and drops merchants that are already tracked
//!
//! Detection is pure. It never touches storage and never fails; a merchant
//! that doesn't qualify is simply not reported.

use chrono::Duration;
use std::collections::BTreeMap;
use tracing::debug;

use crate::models::{merchant_key, DetectionResult, Frequency, Subscription, Transaction};

/// Merchants that are almost always subscriptions
///
/// Matched as substrings of the lower-cased merchant name.
pub const KNOWN_SUBSCRIPTION_MERCHANTS: &[&str] = &[
    "netflix",
    "spotify",
    "apple",
    "amazon prime",
    "disney+",
    "disney plus",
    "adobe",
    "microsoft",
    "hulu",
    "hbo",
    "youtube premium",
    "youtube music",
    "gym",
    "fitness",
    "planet fitness",
    "anytime fitness",
    "dropbox",
    "google one",
    "icloud",
    "onedrive",
    "audible",
    "kindle",
    "paramount+",
    "peacock",
    "stan",
    "binge",
    "kayo",
    "foxtel",
    "optus sport",
];

/// Detection configuration
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    /// Maximum absolute deviation of any charge from the mean amount (dollars)
    pub amount_tolerance: f64,
    /// Candidates scoring below this are discarded
    pub min_confidence: f64,
    /// Brands appended to [`KNOWN_SUBSCRIPTION_MERCHANTS`], lower-cased
    pub extra_known_merchants: Vec<String>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            amount_tolerance: 1.0,
            min_confidence: 0.6,
            extra_known_merchants: Vec::new(),
        }
    }
}

// Confidence weights
const INTERVAL_WEIGHT: f64 = 0.6;
const BASE_CONFIDENCE: f64 = 0.4;
const KNOWN_MERCHANT_BONUS: f64 = 0.2;
const REPEAT_BONUS: f64 = 0.1;
const REPEAT_BONUS_MIN_TRANSACTIONS: usize = 3;

/// Detects recurring billing patterns in a transaction list
#[derive(Debug, Clone, Default)]
pub struct SubscriptionDetector {
    config: DetectionConfig,
}

impl SubscriptionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut config: DetectionConfig) -> Self {
        config.extra_known_merchants = config
            .extra_known_merchants
            .iter()
            .map(|m| merchant_key(m))
            .filter(|m| !m.is_empty())
            .collect();
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Detect subscriptions, skipping merchants already present in `existing`
    ///
    /// Results are ordered by confidence, then average amount (both
    /// descending), then merchant name.
    pub fn detect(
        &self,
        transactions: &[Transaction],
        existing: &[Subscription],
    ) -> Vec<DetectionResult> {
        // BTreeMap so groups are visited in a stable order
        let mut groups: BTreeMap<String, Vec<&Transaction>> = BTreeMap::new();
        for tx in transactions.iter().filter(|t| t.is_expense()) {
            groups
                .entry(merchant_key(&tx.merchant_name))
                .or_default()
                .push(tx);
        }

        let mut results: Vec<DetectionResult> = groups
            .into_iter()
            .filter(|(key, _)| !existing.iter().any(|s| s.matches_merchant(key)))
            .filter_map(|(key, group)| {
                let result = self.analyze_group(&key, &group);
                if result.is_none() {
                    debug!(merchant = %key, count = group.len(), "No recurring pattern");
                }
                result
            })
            .filter(|r| r.confidence >= self.config.min_confidence)
            .collect();

        results.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| b.average_amount.total_cmp(&a.average_amount))
                .then_with(|| a.merchant_name.cmp(&b.merchant_name))
        });

        results
    }

    /// Score a single merchant group, or `None` when it isn't recurring
    fn analyze_group(&self, key: &str, group: &[&Transaction]) -> Option<DetectionResult> {
        if group.len() < 2 {
            return None;
        }

        // Reported name keeps the casing of the first transaction seen
        let display_name = group.first()?.merchant_name.trim().to_string();

        let mut sorted: Vec<&Transaction> = group.to_vec();
        sorted.sort_by_key(|t| t.date);

        let intervals: Vec<i64> = sorted
            .windows(2)
            .map(|w| (w[1].date - w[0].date).num_days())
            .collect();
        let mean_interval = intervals.iter().sum::<i64>() as f64 / intervals.len() as f64;

        let amounts: Vec<f64> = sorted.iter().map(|t| t.amount).collect();
        let mean_amount = amounts.iter().sum::<f64>() / amounts.len() as f64;
        let stable = amounts
            .iter()
            .all(|a| (a - mean_amount).abs() <= self.config.amount_tolerance);
        if !stable {
            return None;
        }

        let frequency = Frequency::from_mean_interval(mean_interval)?;
        let canonical = frequency.canonical_days() as f64;
        let interval_confidence = 1.0 - (mean_interval - canonical).abs() / canonical;

        let mut confidence = interval_confidence * INTERVAL_WEIGHT + BASE_CONFIDENCE;
        if self.is_known_merchant(key) {
            confidence += KNOWN_MERCHANT_BONUS;
        }
        if sorted.len() >= REPEAT_BONUS_MIN_TRANSACTIONS {
            confidence += REPEAT_BONUS;
        }

        let last_date = sorted.last()?.date;

        Some(DetectionResult {
            merchant_name: display_name,
            average_amount: round_cents(mean_amount),
            frequency,
            next_billing_date: last_date + Duration::days(frequency.canonical_days()),
            confidence: confidence.min(1.0),
        })
    }

    fn is_known_merchant(&self, key: &str) -> bool {
        KNOWN_SUBSCRIPTION_MERCHANTS
            .iter()
            .any(|m| key.contains(m))
            || self
                .config
                .extra_known_merchants
                .iter()
                .any(|m| key.contains(m.as_str()))
    }
}

/// Detect subscriptions with the default configuration
pub fn detect_subscriptions(
    transactions: &[Transaction],
    existing: &[Subscription],
) -> Vec<DetectionResult> {
    SubscriptionDetector::new().detect(transactions, existing)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
