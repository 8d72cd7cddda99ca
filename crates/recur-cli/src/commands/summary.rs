//! Spend summary command

use anyhow::{Context, Result};
use recur_core::SyncService;
use tracing::debug;

use super::truncate;

pub fn cmd_summary(service: &SyncService, external_id: &str, json: bool) -> Result<()> {
    let summary = service
        .spend_summary(external_id)
        .with_context(|| format!("Failed to summarize spending for {}", external_id))?;
    debug!(user = %external_id, categories = summary.breakdown.len(), "Built spend summary");

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!();
    println!("📊 Spending {} to {}", summary.from, summary.to);
    println!("   ─────────────────────────────");
    println!("   Income:   ${:>10.2}", summary.income);
    println!("   Expenses: ${:>10.2}", summary.expenses);
    println!("   Net:      ${:>10.2}", summary.net);
    match summary.change_percentage() {
        Some(change) => println!(
            "   vs previous {} days: {:+.1}% (${:.2})",
            recur_core::SPEND_WINDOW_DAYS,
            change,
            summary.previous_total
        ),
        None => println!("   No expenses in the previous period"),
    }

    if !summary.breakdown.is_empty() {
        println!();
        println!("🏷️  By category");
        for category in &summary.breakdown {
            println!(
                "   {:20} │ {:>10} │ {:>5.1}% │ {} txns",
                truncate(&category.label, 20),
                format!("${:.2}", category.amount),
                category.percentage,
                category.transaction_count
            );
        }
    }

    println!();
    println!(
        "🔄 {} subscriptions, ${:.2}/month",
        summary.subscription_count, summary.subscription_total
    );

    Ok(())
}
