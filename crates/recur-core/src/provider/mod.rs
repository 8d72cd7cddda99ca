//! Banking data providers
//!
//! # Architecture
//!
//! - `BankingProvider` trait: what the sync orchestrator needs from a bank feed
//! - `BasiqClient`: HTTP client for Basiq-style open banking APIs
//! - `StaticProvider`: fixture data for tests and local development
//!
//! A missing provider is not an error: the orchestrator switches to demo mode
//! when [`from_config`] returns `None`.

mod basiq;
mod fixtures;
pub mod types;

pub use basiq::{BasiqClient, TokenCache, TOKEN_TTL};
pub use fixtures::StaticProvider;
pub use types::*;

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

use crate::config::ProviderConfig;
use crate::error::Result;
use crate::models::Account;

/// Source of raw transactions and account balances for a provider-side user
///
/// Implementations map every transport or upstream failure to
/// [`Error::ProviderUnavailable`](crate::Error::ProviderUnavailable).
#[async_trait]
pub trait BankingProvider: Send + Sync {
    /// Raw transactions posted within `[from, to]`
    async fn fetch_transactions(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RawTransaction>>;

    /// All accounts linked for the user
    async fn fetch_accounts(&self, user_id: &str) -> Result<Vec<Account>>;

    /// Sum of the current balances across every account
    async fn total_balance(&self, user_id: &str) -> Result<f64> {
        let accounts = self.fetch_accounts(user_id).await?;
        Ok(accounts.iter().map(|a| a.balance).sum())
    }

    /// Name used in logs and health output
    fn name(&self) -> &str;
}

/// Build the live provider, or `None` when no API key is configured
pub fn from_config(config: &ProviderConfig) -> Result<Option<Arc<dyn BankingProvider>>> {
    if !config.is_configured() {
        return Ok(None);
    }
    let client = BasiqClient::new(config.clone())?;
    Ok(Some(Arc::new(client)))
}
