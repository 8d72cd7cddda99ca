//! Fixture provider
//!
//! Serves a fixed set of raw transactions and accounts. Used by tests and
//! handy for exercising the full sync path without provider credentials.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::types::RawTransaction;
use super::BankingProvider;
use crate::error::{Error, Result};
use crate::models::Account;
use crate::normalize::parse_provider_date;

/// In-memory banking provider
#[derive(Debug, Default)]
pub struct StaticProvider {
    transactions: Vec<RawTransaction>,
    accounts: Vec<Account>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl StaticProvider {
    pub fn new(transactions: Vec<RawTransaction>) -> Self {
        Self {
            transactions,
            ..Default::default()
        }
    }

    /// A provider whose every call fails with `ProviderUnavailable`
    pub fn failing() -> Self {
        let provider = Self::default();
        provider.set_failing(true);
        provider
    }

    pub fn with_accounts(mut self, accounts: Vec<Account>) -> Self {
        self.accounts = accounts;
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of provider calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// A zero-balance transaction account with the given id
    pub fn account(id: &str) -> Account {
        Account {
            id: id.to_string(),
            name: "Everyday".to_string(),
            account_no: String::new(),
            balance: 0.0,
            available_balance: 0.0,
            account_type: "transaction".to_string(),
            status: "available".to_string(),
            institution: "AU00000".to_string(),
        }
    }

    fn check(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::ProviderUnavailable(
                "static provider configured to fail".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl BankingProvider for StaticProvider {
    async fn fetch_transactions(
        &self,
        _user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RawTransaction>> {
        self.check()?;

        // Same window semantics as the real API: filter on post date.
        // Records without a usable date are passed through for the
        // normalizer to reject.
        Ok(self
            .transactions
            .iter()
            .filter(|t| {
                match t
                    .post_date
                    .as_deref()
                    .or(t.transaction_date.as_deref())
                    .map(parse_provider_date)
                {
                    Some(Ok(date)) => date >= from && date <= to,
                    _ => true,
                }
            })
            .cloned()
            .collect())
    }

    async fn fetch_accounts(&self, _user_id: &str) -> Result<Vec<Account>> {
        self.check()?;
        Ok(self.accounts.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}
