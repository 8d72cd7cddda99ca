//! Error types for recur

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The banking provider could not be reached or rejected the request
    #[error("Banking provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The persistent store could not be reached
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Whether this error came from the persistence layer
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::StorageUnavailable(_) | Self::Database(_) | Self::Pool(_) | Self::Encryption(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
