//! Sync command implementation

use anyhow::{Context, Result};
use recur_core::models::SyncMode;
use recur_core::{monthly_cost, SyncService};
use tracing::info;

use super::truncate;

pub async fn cmd_sync(service: &SyncService, external_id: &str, json: bool) -> Result<()> {
    info!(user = %external_id, live = service.is_live(), "Starting sync");
    let summary = service
        .sync(external_id)
        .await
        .with_context(|| format!("Sync failed for {}", external_id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!();
    match summary.mode {
        SyncMode::Demo => println!("🎭 Demo sync (no banking provider configured)"),
        SyncMode::Live => println!("🔄 Synced {}", external_id),
    }
    println!("   ─────────────────────────────");
    println!("   Balance: ${:.2}", summary.balance);
    println!("   Transactions added: {}", summary.transactions_added);
    println!("   New subscriptions: {}", summary.subscriptions_detected);
    if summary.mode == SyncMode::Live && !summary.persisted {
        println!("   ⚠️  Not persisted (user not registered or store unavailable)");
    }

    if !summary.subscriptions.is_empty() {
        println!();
        println!("📋 Subscriptions");
        for sub in &summary.subscriptions {
            println!(
                "   {} {:20} │ {:>8}/{:<7} │ next {}",
                if sub.auto_detected { "🔍" } else { "✅" },
                truncate(&sub.merchant_name, 20),
                format!("${:.2}", sub.amount),
                sub.frequency.as_str(),
                sub.next_billing_date
            );
        }
        println!(
            "   Monthly cost: ${:.2}",
            monthly_cost(&summary.subscriptions)
        );
    }

    Ok(())
}
