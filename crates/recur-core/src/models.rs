//! Domain models for recur

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Direction of a normalized transaction
///
/// Amounts are always stored unsigned; this is the only place the
/// direction of money movement is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
    Transfer,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Transfer => "transfer",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "transfer" => Ok(Self::Transfer),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse spending category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    FoodDining,
    Transportation,
    Shopping,
    Health,
    Entertainment,
    BillsUtilities,
    Income,
    Transfer,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FoodDining => "food-dining",
            Self::Transportation => "transportation",
            Self::Shopping => "shopping",
            Self::Health => "health",
            Self::Entertainment => "entertainment",
            Self::BillsUtilities => "bills-utilities",
            Self::Income => "income",
            Self::Transfer => "transfer",
            Self::Other => "other",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::FoodDining => "Food & Dining",
            Self::Transportation => "Transportation",
            Self::Shopping => "Shopping",
            Self::Health => "Health",
            Self::Entertainment => "Entertainment",
            Self::BillsUtilities => "Bills & Utilities",
            Self::Income => "Income",
            Self::Transfer => "Transfer",
            Self::Other => "Other",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "food-dining" => Ok(Self::FoodDining),
            "transportation" => Ok(Self::Transportation),
            "shopping" => Ok(Self::Shopping),
            "health" => Ok(Self::Health),
            "entertainment" => Ok(Self::Entertainment),
            "bills-utilities" => Ok(Self::BillsUtilities),
            "income" => Ok(Self::Income),
            "transfer" => Ok(Self::Transfer),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A normalized transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Local row id, `None` until persisted
    pub id: Option<i64>,
    /// Provider-assigned id; the idempotency key for merges
    pub external_id: String,
    pub user_id: Option<i64>,
    pub merchant_name: String,
    /// Always >= 0
    pub amount: f64,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub category: Category,
    pub date: NaiveDate,
    pub description: Option<String>,
}

impl Transaction {
    pub fn is_expense(&self) -> bool {
        self.transaction_type == TransactionType::Expense
    }
}

/// Subscription billing frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// Reference day count for an ideal cycle
    pub fn canonical_days(&self) -> i64 {
        match self {
            Self::Weekly => 7,
            Self::Monthly => 30,
            Self::Yearly => 365,
        }
    }

    /// Inclusive range of mean intervals (in days) accepted for this frequency
    pub fn band(&self) -> (f64, f64) {
        match self {
            Self::Weekly => (6.0, 8.0),
            Self::Monthly => (28.0, 32.0),
            Self::Yearly => (360.0, 370.0),
        }
    }

    /// Classify a mean interval into a frequency band
    pub fn from_mean_interval(days: f64) -> Option<Self> {
        [Self::Weekly, Self::Monthly, Self::Yearly]
            .into_iter()
            .find(|f| {
                let (lo, hi) = f.band();
                days >= lo && days <= hi
            })
    }

    /// Convert a per-cycle amount into a monthly figure
    pub fn to_monthly(&self, amount: f64) -> f64 {
        match self {
            Self::Weekly => amount * 4.33,
            Self::Monthly => amount,
            Self::Yearly => amount / 12.0,
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(format!("Unknown frequency: {}", s)),
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn default_active() -> bool {
    true
}

/// A tracked subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub merchant_name: String,
    /// Amount charged per cycle
    pub amount: f64,
    pub frequency: Frequency,
    pub next_billing_date: NaiveDate,
    pub detected_at: DateTime<Utc>,
    /// Soft-delete flag; an absent flag deserializes as active
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// True when inferred by the detector rather than entered by the user
    #[serde(default)]
    pub auto_detected: bool,
}

impl Subscription {
    /// Equivalent monthly cost; inactive subscriptions cost nothing
    pub fn monthly_amount(&self) -> f64 {
        if !self.is_active {
            return 0.0;
        }
        self.frequency.to_monthly(self.amount)
    }

    /// Case-insensitive, whitespace-trimmed merchant comparison
    pub fn matches_merchant(&self, merchant: &str) -> bool {
        merchant_key(&self.merchant_name) == merchant_key(merchant)
    }
}

/// Subscription data to be written to the store
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub user_id: i64,
    pub merchant_name: String,
    pub amount: f64,
    pub frequency: Frequency,
    pub next_billing_date: NaiveDate,
    pub auto_detected: bool,
}

/// A recurring pattern found by the detector (never persisted as-is)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub merchant_name: String,
    /// Mean amount per charge, rounded to cents
    pub average_amount: f64,
    pub frequency: Frequency,
    pub next_billing_date: NaiveDate,
    /// Heuristic score in [0, 1]
    pub confidence: f64,
}

impl DetectionResult {
    /// Build the store record for this detection
    pub fn to_new_subscription(&self, user_id: i64) -> NewSubscription {
        NewSubscription {
            user_id,
            merchant_name: self.merchant_name.clone(),
            amount: self.average_amount,
            frequency: self.frequency,
            next_billing_date: self.next_billing_date,
            auto_detected: true,
        }
    }

    /// Present this detection as an unsaved, active subscription
    pub fn to_subscription(&self, user_id: Option<i64>, detected_at: DateTime<Utc>) -> Subscription {
        Subscription {
            id: None,
            user_id,
            merchant_name: self.merchant_name.clone(),
            amount: self.average_amount,
            frequency: self.frequency,
            next_billing_date: self.next_billing_date,
            detected_at,
            is_active: true,
            auto_detected: true,
        }
    }
}

/// A local user mapped to a banking provider user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    /// Provider-side user id
    pub external_id: String,
    pub created_at: DateTime<Utc>,
    pub last_sync_at: Option<DateTime<Utc>>,
}

/// A bank account reported by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    pub account_no: String,
    pub balance: f64,
    pub available_balance: f64,
    pub account_type: String,
    pub status: String,
    pub institution: String,
}

/// Which operating mode produced a sync summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Data came from the configured banking provider
    Live,
    /// No provider configured; deterministic demo data
    Demo,
}

/// Result of a sync, returned to the caller and not persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    /// Transactions from the summary window, most recent first
    pub transactions: Vec<Transaction>,
    /// Active subscriptions plus those detected by this sync
    pub subscriptions: Vec<Subscription>,
    pub balance: f64,
    pub transactions_added: usize,
    pub subscriptions_detected: usize,
    pub last_sync_at: DateTime<Utc>,
    pub mode: SyncMode,
    /// Whether anything was durably written
    pub persisted: bool,
}

/// Grouping key for merchant names: lower-cased and trimmed
pub fn merchant_key(name: &str) -> String {
    name.trim().to_lowercase()
}
