//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Recur - Sync bank transactions and track subscriptions
#[derive(Parser)]
#[command(name = "recur")]
#[command(about = "Bank transaction sync and subscription detection", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "recur.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set RECUR_DB_KEY environment variable with your passphrase.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    /// Config file (defaults to RECUR_CONFIG, then the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Manage local users
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },

    /// Sync a provider user: fetch, reconcile, detect subscriptions
    Sync {
        /// Provider user id
        external_id: String,

        /// Print the sync summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage tracked subscriptions
    Subscriptions {
        #[command(subcommand)]
        action: SubscriptionsAction,
    },

    /// Summarize recent spending by category
    Summary {
        /// Provider user id
        external_id: String,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List recent transactions straight from the banking provider
    Transactions {
        /// Provider user id
        external_id: String,

        /// How many days back to list
        #[arg(short, long, default_value = "30")]
        days: i64,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

#[derive(Subcommand)]
pub enum UsersAction {
    /// Register a provider user so syncs are persisted
    Add {
        /// Provider user id
        external_id: String,
    },

    /// List registered users
    List,
}

#[derive(Subcommand)]
pub enum SubscriptionsAction {
    /// List active subscriptions for a user
    List {
        /// Provider user id
        external_id: String,
    },

    /// Stop tracking a subscription
    Remove {
        /// Subscription ID
        id: i64,
    },
}
