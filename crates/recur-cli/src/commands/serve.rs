//! Server command implementation

use std::path::Path;

use anyhow::Result;
use recur_core::RecurConfig;
use recur_server::ServerConfig;

use super::open_service;

/// Server settings taken from the loaded configuration
pub fn server_config(config: &RecurConfig) -> ServerConfig {
    ServerConfig {
        allowed_origins: config.server.allowed_origins.clone(),
    }
}

pub async fn cmd_serve(
    db_path: &Path,
    host: &str,
    port: u16,
    no_encrypt: bool,
    config: &RecurConfig,
) -> Result<()> {
    println!("🚀 Starting recur web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);
    if no_encrypt {
        println!("   ⚠️  Encryption DISABLED (--no-encrypt)");
    }

    let service = open_service(db_path, no_encrypt, config)?;
    match service.provider_name() {
        Some(name) => println!("   🏦 Banking provider: {}", name),
        None => println!("   🎭 Demo mode (set BASIQ_API_KEY for live data)"),
    }
    let settings = server_config(config);
    if !settings.allowed_origins.is_empty() {
        println!("   🌐 CORS origins: {}", settings.allowed_origins.join(", "));
    }
    println!();
    println!("   Press Ctrl+C to stop");

    recur_server::serve(service, host, port, settings).await?;

    Ok(())
}
