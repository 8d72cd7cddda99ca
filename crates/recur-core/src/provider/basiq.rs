//! Basiq open banking client
//!
//! Server-side access only: a single API key is exchanged for a short-lived
//! bearer token that is shared by every request this client makes.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::types::{Page, RawAccount, RawTransaction};
use super::BankingProvider;
use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::models::Account;

/// How long an issued token is reused before a new one is requested
pub const TOKEN_TTL: Duration = Duration::from_secs(50 * 60);

const API_VERSION_HEADER: &str = "basiq-version";
const API_VERSION: &str = "3.0";
const PAGE_LIMIT: &str = "500";
// Upper bound on pages followed for one listing
const MAX_PAGES: usize = 200;

/// Cached server access token
///
/// Owned by a client (or shared between clients through an `Arc`). Holding
/// the lock while refreshing means concurrent requests wait for one token
/// request instead of each issuing their own.
#[derive(Debug, Default)]
pub struct TokenCache {
    inner: Mutex<Option<CachedToken>>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached token, or run `refresh` and cache its result for `ttl`
    ///
    /// The lock is held across `refresh`. A failed refresh leaves the cache
    /// empty.
    pub async fn get_or_refresh<F, Fut>(&self, ttl: Duration, refresh: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let mut guard = self.inner.lock().await;
        if let Some(token) = guard.as_ref().filter(|t| t.expires_at > Instant::now()) {
            return Ok(token.value.clone());
        }

        let value = refresh().await?;
        *guard = Some(CachedToken {
            value: value.clone(),
            expires_at: Instant::now() + ttl,
        });
        Ok(value)
    }

    pub async fn invalidate(&self) {
        *self.inner.lock().await = None;
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// HTTP client for the Basiq API
pub struct BasiqClient {
    http_client: Client,
    config: ProviderConfig,
    tokens: Arc<TokenCache>,
}

impl BasiqClient {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        Self::with_token_cache(config, Arc::new(TokenCache::new()))
    }

    /// Create a client that shares an existing token cache
    pub fn with_token_cache(mut config: ProviderConfig, tokens: Arc<TokenCache>) -> Result<Self> {
        config.api_url = config.api_url.trim_end_matches('/').to_string();
        let http_client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http_client,
            config,
            tokens,
        })
    }

    pub fn token_cache(&self) -> Arc<TokenCache> {
        self.tokens.clone()
    }

    fn base_url(&self) -> &str {
        &self.config.api_url
    }

    /// Return the cached token or request a new one
    async fn access_token(&self) -> Result<String> {
        self.tokens
            .get_or_refresh(TOKEN_TTL, || self.request_token())
            .await
    }

    async fn request_token(&self) -> Result<String> {
        debug!("Requesting Basiq server token");
        let response = self
            .http_client
            .post(format!("{}/token", self.base_url()))
            .header(AUTHORIZATION, format!("Basic {}", self.config.api_key))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(API_VERSION_HEADER, API_VERSION)
            .body("scope=SERVER_ACCESS")
            .send()
            .await
            .map_err(unavailable)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ProviderUnavailable(format!(
                "token request failed with status {}",
                status
            )));
        }

        let token: TokenResponse = response.json().await.map_err(unavailable)?;
        Ok(token.access_token)
    }

    async fn send_get(&self, url: &Url, token: &str) -> Result<Response> {
        self.http_client
            .get(url.clone())
            .bearer_auth(token)
            .header(API_VERSION_HEADER, API_VERSION)
            .send()
            .await
            .map_err(unavailable)
    }

    /// GET a JSON document, refreshing the token once if it was rejected
    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        let token = self.access_token().await?;
        let mut response = self.send_get(url, &token).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("Basiq token rejected, refreshing");
            self.tokens.invalidate().await;
            let token = self.access_token().await?;
            response = self.send_get(url, &token).await?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ProviderUnavailable(format!(
                "GET {} returned status {}",
                url.path(),
                status
            )));
        }

        response.json().await.map_err(unavailable)
    }

    fn url(&self, path: &str) -> Result<Url> {
        Url::parse(&format!("{}{}", self.base_url(), path))
            .map_err(|e| Error::Config(format!("Invalid provider URL {}: {}", self.base_url(), e)))
    }

    /// Resolve a `links.next` value, which may be absolute or relative
    fn next_url(&self, next: &str) -> Result<Url> {
        if next.starts_with("http://") || next.starts_with("https://") {
            Url::parse(next).map_err(|e| {
                Error::ProviderUnavailable(format!("Invalid pagination link {}: {}", next, e))
            })
        } else {
            self.url(next)
        }
    }
}

#[async_trait]
impl BankingProvider for BasiqClient {
    async fn fetch_transactions(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RawTransaction>> {
        let filter = format!(
            "transaction.postDate.bt('{}','{}')",
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        );
        let mut url = self.url(&format!("/users/{}/transactions", user_id))?;
        url.query_pairs_mut()
            .append_pair("filter", &filter)
            .append_pair("limit", PAGE_LIMIT);

        let mut transactions = Vec::new();
        for page_number in 1..=MAX_PAGES {
            let page: Page<RawTransaction> = self.get_json(&url).await?;
            debug!(page = page_number, count = page.data.len(), "Fetched transaction page");
            transactions.extend(page.data);

            match page.links.and_then(|l| l.next) {
                Some(next) if !next.is_empty() => {
                    let next_url = self.next_url(&next)?;
                    if next_url == url {
                        break;
                    }
                    url = next_url;
                }
                _ => break,
            }

            if page_number == MAX_PAGES {
                warn!(user = %user_id, "Stopped following transaction pages at the page limit");
            }
        }

        info!(user = %user_id, count = transactions.len(), "Fetched transactions from Basiq");
        Ok(transactions)
    }

    async fn fetch_accounts(&self, user_id: &str) -> Result<Vec<Account>> {
        let url = self.url(&format!("/users/{}/accounts", user_id))?;
        let page: Page<RawAccount> = self.get_json(&url).await?;
        Ok(page.data.into_iter().map(Account::from).collect())
    }

    fn name(&self) -> &str {
        "basiq"
    }
}

fn unavailable(e: reqwest::Error) -> Error {
    Error::ProviderUnavailable(e.to_string())
}
