//! Subscription command implementations

use anyhow::{Context, Result};
use recur_core::{monthly_cost, SyncService};

use super::truncate;

pub fn cmd_subscriptions_list(service: &SyncService, external_id: &str) -> Result<()> {
    let subscriptions = service.list_subscriptions(external_id)?;

    if subscriptions.is_empty() {
        println!("No subscriptions tracked yet. Run:");
        println!("  recur sync {}", external_id);
        return Ok(());
    }

    println!();
    println!("📋 Active Subscriptions");
    println!("   ─────────────────────────────────────────────────────────────");

    for sub in &subscriptions {
        println!(
            "   {:>4} │ {:20} │ {:>8}/{:<7} │ next {}",
            sub.id.unwrap_or_default(),
            truncate(&sub.merchant_name, 20),
            format!("${:.2}", sub.amount),
            sub.frequency.as_str(),
            sub.next_billing_date
        );
    }

    println!();
    println!("   💰 Monthly cost: ${:.2}", monthly_cost(&subscriptions));

    Ok(())
}

pub fn cmd_subscriptions_remove(service: &SyncService, id: i64) -> Result<()> {
    service
        .remove_subscription(id)
        .with_context(|| format!("Failed to remove subscription {}", id))?;

    println!("✅ Subscription removed (ID: {})", id);

    Ok(())
}
