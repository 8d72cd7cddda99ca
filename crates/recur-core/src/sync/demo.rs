//! Demo dataset served when no banking provider is configured
//!
//! The data is a pure function of the clock passed in, so the same `now`
//! always produces the same summary.

use chrono::{DateTime, Duration, Utc};

use crate::models::{
    Category, Frequency, Subscription, SyncMode, SyncSummary, Transaction, TransactionType,
};

const OPENING_BALANCE: f64 = 12_847.50;
const DEMO_DAYS: i64 = 30;

struct DemoMerchant {
    name: &'static str,
    category: Category,
    transaction_type: TransactionType,
    min: f64,
    max: f64,
}

const fn expense(name: &'static str, category: Category, min: f64, max: f64) -> DemoMerchant {
    DemoMerchant {
        name,
        category,
        transaction_type: TransactionType::Expense,
        min,
        max,
    }
}

const fn income(name: &'static str, min: f64, max: f64) -> DemoMerchant {
    DemoMerchant {
        name,
        category: Category::Income,
        transaction_type: TransactionType::Income,
        min,
        max,
    }
}

const MERCHANTS: &[DemoMerchant] = &[
    expense("Woolworths", Category::FoodDining, 20.0, 150.0),
    expense("Coles", Category::FoodDining, 15.0, 120.0),
    expense("Uber Eats", Category::FoodDining, 20.0, 60.0),
    expense("Shell", Category::Transportation, 40.0, 100.0),
    expense("Netflix", Category::Entertainment, 16.0, 23.0),
    expense("Spotify", Category::Entertainment, 12.0, 12.0),
    expense("Origin Energy", Category::BillsUtilities, 80.0, 200.0),
    expense("Telstra", Category::BillsUtilities, 89.0, 89.0),
    expense("JB Hi-Fi", Category::Shopping, 50.0, 500.0),
    income("Employer Salary", 3500.0, 4500.0),
    income("Interest", 5.0, 20.0),
];

/// Build the demo summary for a fixed clock
pub fn demo_summary(now: DateTime<Utc>) -> SyncSummary {
    let transactions = demo_transactions(now);
    let subscriptions = demo_subscriptions(now);

    let (income, expenses) = transactions.iter().fold((0.0, 0.0), |(inc, exp), t| {
        match t.transaction_type {
            TransactionType::Income => (inc + t.amount, exp),
            TransactionType::Expense => (inc, exp + t.amount),
            TransactionType::Transfer => (inc, exp),
        }
    });

    SyncSummary {
        transactions_added: transactions.len(),
        transactions,
        subscriptions,
        balance: round_cents(OPENING_BALANCE + income - expenses),
        subscriptions_detected: 0,
        last_sync_at: now,
        mode: SyncMode::Demo,
        persisted: false,
    }
}

/// Between one and four transactions per day for the last 30 days, newest first
pub fn demo_transactions(now: DateTime<Utc>) -> Vec<Transaction> {
    let today = now.date_naive();
    let mut transactions = Vec::new();

    for day in 0..DEMO_DAYS {
        let date = today - Duration::days(day);
        let per_day = (day % 4) + 1;

        for slot in 0..per_day {
            let merchant = &MERCHANTS[((day * 7 + slot * 3) as usize) % MERCHANTS.len()];
            let fraction = ((day * 31 + slot * 17) % 100) as f64 / 100.0;
            let amount = merchant.min + fraction * (merchant.max - merchant.min);

            transactions.push(Transaction {
                id: None,
                external_id: format!("demo-{}-{}", day, slot),
                user_id: None,
                merchant_name: merchant.name.to_string(),
                amount: round_cents(amount),
                transaction_type: merchant.transaction_type,
                category: merchant.category,
                date,
                description: None,
            });
        }
    }

    transactions
}

/// The subscriptions a demo user is already tracking
pub fn demo_subscriptions(now: DateTime<Utc>) -> Vec<Subscription> {
    let today = now.date_naive();
    let sub = |merchant: &str, amount: f64, due_in: i64, auto_detected: bool| Subscription {
        id: None,
        user_id: None,
        merchant_name: merchant.to_string(),
        amount,
        frequency: Frequency::Monthly,
        next_billing_date: today + Duration::days(due_in),
        detected_at: now,
        is_active: true,
        auto_detected,
    };

    vec![
        sub("Netflix", 22.99, 15, true),
        sub("Spotify", 11.99, 8, true),
        sub("Telstra", 89.00, 22, false),
    ]
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
