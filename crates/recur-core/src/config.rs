//! Configuration for recur
//!
//! Settings are layered, later layers winning:
//! 1. Built-in defaults
//! 2. A TOML file (`--config`, else `RECUR_CONFIG`, else
//!    `~/.local/share/recur/config/recur.toml`)
//! 3. Environment variables (`BASIQ_API_KEY`, `BASIQ_API_URL`,
//!    `RECUR_ALLOWED_ORIGINS`)
//!
//! Example `recur.toml`:
//!
//! ```toml
//! [provider]
//! api_url = "https://au-api.basiq.io"
//! api_key = "..."
//! timeout_secs = 30
//!
//! [sync]
//! history_days = 90
//! summary_days = 30
//! timeout_secs = 60
//!
//! [detection]
//! amount_tolerance = 1.0
//! min_confidence = 0.6
//! extra_known_merchants = ["crunchyroll"]
//!
//! [server]
//! allowed_origins = ["http://localhost:5173"]
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::detect::DetectionConfig;
use crate::error::{Error, Result};

pub const DEFAULT_API_URL: &str = "https://au-api.basiq.io";

/// Placeholder written by setup scripts before a real key is supplied
pub const API_KEY_PLACEHOLDER: &str = "[TO_BE_CONFIGURED]";

/// Banking provider connection settings
#[derive(Clone)]
pub struct ProviderConfig {
    pub api_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Whether a usable API key is present
    pub fn is_configured(&self) -> bool {
        let key = self.api_key.trim();
        !key.is_empty() && key != API_KEY_PLACEHOLDER
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

// Keep the API key out of logs
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &if self.is_configured() { "<set>" } else { "<unset>" })
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Sync windows and limits
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Days of history fetched from the provider on each sync
    pub history_days: i64,
    /// Days of transactions returned in a sync summary
    pub summary_days: i64,
    /// Upper bound on a whole sync when run by the server
    pub timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            history_days: 90,
            summary_days: 30,
            timeout: Duration::from_secs(60),
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Default)]
pub struct ServerSettings {
    /// Allowed CORS origins; empty means same-origin only
    pub allowed_origins: Vec<String>,
}

/// Full recur configuration
#[derive(Debug, Clone, Default)]
pub struct RecurConfig {
    pub provider: ProviderConfig,
    pub sync: SyncConfig,
    pub detection: DetectionConfig,
    pub server: ServerSettings,
}

impl RecurConfig {
    /// Load configuration from the standard locations plus the process environment
    ///
    /// An explicit `path` must exist. The `RECUR_CONFIG` and default locations
    /// are optional and fall back to built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match resolve_config_path(path)? {
            Some(path) => {
                debug!(path = %path.display(), "Loading config");
                let content = fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                Self::from_toml(&content)?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a TOML document on top of the built-in defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

        let mut config = Self::default();

        if let Some(provider) = raw.provider {
            if let Some(url) = provider.api_url {
                config.provider.api_url = url;
            }
            if let Some(key) = provider.api_key {
                config.provider.api_key = key;
            }
            if let Some(secs) = provider.timeout_secs {
                config.provider.timeout = Duration::from_secs(secs);
            }
        }

        if let Some(sync) = raw.sync {
            if let Some(days) = sync.history_days {
                config.sync.history_days = days;
            }
            if let Some(days) = sync.summary_days {
                config.sync.summary_days = days;
            }
            if let Some(secs) = sync.timeout_secs {
                config.sync.timeout = Duration::from_secs(secs);
            }
        }

        if let Some(detection) = raw.detection {
            if let Some(tolerance) = detection.amount_tolerance {
                config.detection.amount_tolerance = tolerance;
            }
            if let Some(min) = detection.min_confidence {
                config.detection.min_confidence = min;
            }
            if let Some(extra) = detection.extra_known_merchants {
                config.detection.extra_known_merchants = extra;
            }
        }

        if let Some(origins) = raw.server.and_then(|s| s.allowed_origins) {
            config.server.allowed_origins = origins;
        }

        config.validate()?;
        Ok(config)
    }

    /// Override settings from environment variables
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("BASIQ_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.provider.api_key = key;
        }
        if let Some(url) = lookup("BASIQ_API_URL").filter(|u| !u.trim().is_empty()) {
            self.provider.api_url = url;
        }
        if let Some(origins) = lookup("RECUR_ALLOWED_ORIGINS") {
            self.server.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
    }

    fn validate(&self) -> Result<()> {
        if self.sync.history_days <= 0 || self.sync.summary_days <= 0 {
            return Err(Error::Config("sync windows must be at least one day".into()));
        }
        if !(0.0..=1.0).contains(&self.detection.min_confidence) {
            return Err(Error::Config(format!(
                "detection.min_confidence must be between 0 and 1, got {}",
                self.detection.min_confidence
            )));
        }
        if self.detection.amount_tolerance < 0.0 {
            return Err(Error::Config("detection.amount_tolerance cannot be negative".into()));
        }
        Ok(())
    }
}

/// Default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("recur").join("config").join("recur.toml"))
}

fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }

    let candidate = std::env::var("RECUR_CONFIG")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .or_else(default_config_path);

    Ok(candidate.filter(|p| p.exists()))
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    provider: Option<RawProvider>,
    sync: Option<RawSync>,
    detection: Option<RawDetection>,
    server: Option<RawServer>,
}

#[derive(Debug, Deserialize)]
struct RawProvider {
    api_url: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawSync {
    history_days: Option<i64>,
    summary_days: Option<i64>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawDetection {
    amount_tolerance: Option<f64>,
    min_confidence: Option<f64>,
    extra_known_merchants: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawServer {
    allowed_origins: Option<Vec<String>>,
}
