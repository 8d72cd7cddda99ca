//! Spend summaries
//!
//! Pre-aggregated view of recent spending: a per-category breakdown of the
//! current window, the expense total of the window before it, income, net
//! and subscription load. Pure over its inputs.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

use crate::cost::monthly_cost;
use crate::models::{Category, Subscription, Transaction, TransactionType};

/// Length of a summary window in days
pub const SPEND_WINDOW_DAYS: i64 = 14;

/// Number of categories reported as top categories
const TOP_CATEGORIES: usize = 3;

/// Expense total for one category in the current window
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpend {
    pub category: Category,
    pub label: String,
    pub amount: f64,
    /// Share of the window's expenses, 0-100
    pub percentage: f64,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendSummary {
    /// First day of the current window
    pub from: NaiveDate,
    /// Last day of the current window
    pub to: NaiveDate,
    /// Categories by expense amount, largest first
    pub breakdown: Vec<CategorySpend>,
    /// Expenses in the window immediately before `from`
    pub previous_total: f64,
    pub top_categories: Vec<Category>,
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
    pub subscription_count: usize,
    /// Monthly-normalized cost of the active subscriptions
    pub subscription_total: f64,
}

impl SpendSummary {
    /// Change in expenses against the previous window, in percent
    ///
    /// `None` when the previous window had no expenses.
    pub fn change_percentage(&self) -> Option<f64> {
        (self.previous_total > 0.0)
            .then(|| (self.expenses - self.previous_total) / self.previous_total * 100.0)
    }
}

/// Summarize `transactions` for the `window_days` ending on `today`
///
/// The current window runs from `today - window_days` to `today` inclusive;
/// the previous window is the same length and ends the day before. Transfers
/// count towards neither income nor expenses.
pub fn spend_summary(
    transactions: &[Transaction],
    subscriptions: &[Subscription],
    today: NaiveDate,
    window_days: i64,
) -> SpendSummary {
    let from = today - Duration::days(window_days);
    let previous_from = from - Duration::days(window_days);

    let mut by_category: HashMap<Category, (f64, usize)> = HashMap::new();
    let mut expenses = 0.0;
    let mut income = 0.0;
    let mut previous_total = 0.0;

    for tx in transactions {
        if tx.date > today || tx.date < previous_from {
            continue;
        }
        if tx.date < from {
            if tx.transaction_type == TransactionType::Expense {
                previous_total += tx.amount;
            }
            continue;
        }

        match tx.transaction_type {
            TransactionType::Expense => {
                let entry = by_category.entry(tx.category).or_default();
                entry.0 += tx.amount;
                entry.1 += 1;
                expenses += tx.amount;
            }
            TransactionType::Income => income += tx.amount,
            TransactionType::Transfer => {}
        }
    }

    let mut breakdown: Vec<CategorySpend> = by_category
        .into_iter()
        .map(|(category, (amount, transaction_count))| CategorySpend {
            category,
            label: category.label().to_string(),
            amount,
            percentage: if expenses > 0.0 {
                amount / expenses * 100.0
            } else {
                0.0
            },
            transaction_count,
        })
        .collect();
    breakdown.sort_by(|a, b| {
        b.amount
            .total_cmp(&a.amount)
            .then_with(|| a.category.as_str().cmp(b.category.as_str()))
    });

    let top_categories = breakdown
        .iter()
        .take(TOP_CATEGORIES)
        .map(|c| c.category)
        .collect();

    SpendSummary {
        from,
        to: today,
        breakdown,
        previous_total,
        top_categories,
        income,
        expenses,
        net: income - expenses,
        subscription_count: subscriptions.iter().filter(|s| s.is_active).count(),
        subscription_total: monthly_cost(subscriptions),
    }
}
