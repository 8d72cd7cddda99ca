//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `load_config` - Layered configuration
//! - `open_service` / `build_service` - Wire provider, store and detector
//! - `cmd_init` - Initialize the database

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use recur_core::{provider, BankingProvider, Database, RecurConfig, Store, SyncService};
use tracing::{debug, info};

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path must be valid UTF-8")?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

/// Defaults, then the config file, then BASIQ_* environment variables
pub fn load_config(path: Option<&Path>) -> Result<RecurConfig> {
    RecurConfig::load(path).context("Failed to load configuration")
}

/// Assemble a sync service from an opened store and an optional provider
pub fn build_service(
    db: Database,
    provider: Option<Arc<dyn BankingProvider>>,
    config: &RecurConfig,
) -> SyncService {
    let store: Arc<dyn Store> = Arc::new(db);
    SyncService::new(provider, Some(store))
        .with_sync_config(config.sync.clone())
        .with_detection_config(config.detection.clone())
}

/// Open the database and the configured provider (demo mode when unset)
pub fn open_service(db_path: &Path, no_encrypt: bool, config: &RecurConfig) -> Result<SyncService> {
    let db = open_db(db_path, no_encrypt)?;
    let provider =
        provider::from_config(&config.provider).context("Failed to create banking client")?;
    match provider.as_deref() {
        Some(p) => debug!(provider = p.name(), db = %db_path.display(), "Opened sync service"),
        None => info!("No banking provider configured, using demo data"),
    }
    Ok(build_service(db, provider, config))
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool, config: &RecurConfig) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let _db = open_db(db_path, no_encrypt)?;

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    if config.provider.is_configured() {
        println!("   🏦 Banking provider: {}", config.provider.api_url);
    } else {
        println!("   💡 Banking provider not configured, syncs serve demo data");
        println!("      Set BASIQ_API_KEY or add [provider] api_key to recur.toml");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Register a user: recur users add <provider-user-id>");
    println!("  2. Sync: recur sync <provider-user-id>");

    Ok(())
}
