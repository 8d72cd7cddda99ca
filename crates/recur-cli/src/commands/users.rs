//! User command implementations

use anyhow::{Context, Result};
use recur_core::Database;

use super::truncate;

pub fn cmd_users_add(db: &Database, external_id: &str) -> Result<()> {
    let user = db
        .create_user(external_id)
        .with_context(|| format!("Failed to add user {}", external_id))?;

    println!("✅ User registered (ID: {}) for {}", user.id, user.external_id);
    println!("   Sync with: recur sync {}", user.external_id);

    Ok(())
}

pub fn cmd_users_list(db: &Database) -> Result<()> {
    let users = db.list_users()?;

    if users.is_empty() {
        println!("No users registered. Add one with:");
        println!("  recur users add <provider-user-id>");
        return Ok(());
    }

    println!();
    println!("👤 Users");
    println!("   ─────────────────────────────────────────────────────────────");

    for user in users {
        let last_sync = user
            .last_sync_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "   {:>4} │ {:30} │ last sync {}",
            user.id,
            truncate(&user.external_id, 30),
            last_sync
        );
    }

    Ok(())
}
