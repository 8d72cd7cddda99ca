//! Transaction command implementation

use anyhow::{bail, Result};
use chrono::{Duration, Utc};
use recur_core::models::TransactionType;
use recur_core::SyncService;

use super::truncate;

pub async fn cmd_transactions(service: &SyncService, external_id: &str, days: i64) -> Result<()> {
    if days < 1 {
        bail!("--days must be at least 1");
    }
    if !service.is_live() {
        bail!("Banking provider not configured (set BASIQ_API_KEY)");
    }

    let to = Utc::now().date_naive();
    let from = to - Duration::days(days);
    let transactions = service.fetch_transactions(external_id, from, to).await?;

    if transactions.is_empty() {
        println!("No transactions between {} and {}.", from, to);
        return Ok(());
    }

    println!();
    println!("📝 Transactions {} → {}", from, to);
    println!("   ─────────────────────────────────────────────────────────────");

    for tx in &transactions {
        let amount_str = match tx.transaction_type {
            TransactionType::Expense => format!("\x1b[31m-${:.2}\x1b[0m", tx.amount), // Red for expenses
            TransactionType::Income => format!("\x1b[32m+${:.2}\x1b[0m", tx.amount), // Green for income
            TransactionType::Transfer => format!("${:.2}", tx.amount),
        };

        println!(
            "   {} │ {:>10} │ {:15} │ {}",
            tx.date,
            amount_str,
            tx.category.label(),
            truncate(&tx.merchant_name, 40)
        );
    }

    println!();
    println!("   {} transactions", transactions.len());

    Ok(())
}
