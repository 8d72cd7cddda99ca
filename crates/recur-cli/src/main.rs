//! Recur CLI - Bank sync and subscription tracker
//!
//! Usage:
//!   recur init                     Initialize database
//!   recur users add <id>           Register a provider user
//!   recur sync <id>                Sync and detect subscriptions
//!   recur summary <id>             Recent spending by category
//!   recur serve --port 3000        Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt, &config),
        Commands::Users { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                UsersAction::Add { external_id } => commands::cmd_users_add(&db, &external_id),
                UsersAction::List => commands::cmd_users_list(&db),
            }
        }
        Commands::Sync { external_id, json } => {
            let service = commands::open_service(&cli.db, cli.no_encrypt, &config)?;
            commands::cmd_sync(&service, &external_id, json).await
        }
        Commands::Subscriptions { action } => {
            let service = commands::open_service(&cli.db, cli.no_encrypt, &config)?;
            match action {
                SubscriptionsAction::List { external_id } => {
                    commands::cmd_subscriptions_list(&service, &external_id)
                }
                SubscriptionsAction::Remove { id } => {
                    commands::cmd_subscriptions_remove(&service, id)
                }
            }
        }
        Commands::Summary { external_id, json } => {
            let service = commands::open_service(&cli.db, cli.no_encrypt, &config)?;
            commands::cmd_summary(&service, &external_id, json)
        }
        Commands::Transactions { external_id, days } => {
            let service = commands::open_service(&cli.db, cli.no_encrypt, &config)?;
            commands::cmd_transactions(&service, &external_id, days).await
        }
        Commands::Serve { port, host } => {
            commands::cmd_serve(&cli.db, &host, port, cli.no_encrypt, &config).await
        }
    }
}
