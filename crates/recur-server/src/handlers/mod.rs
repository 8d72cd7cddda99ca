//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod accounts;
pub mod health;
pub mod subscriptions;
pub mod summary;
pub mod sync;
pub mod transactions;

// Re-export all handlers for use in router
pub use accounts::*;
pub use health::*;
pub use subscriptions::*;
pub use summary::*;
pub use sync::*;
pub use transactions::*;

use axum::extract::Request;
use serde::de::DeserializeOwned;

use crate::{AppError, MAX_BODY_SIZE};

/// Read and parse a JSON request body
///
/// Malformed or oversized bodies are a 400, not an extractor rejection.
pub(crate) async fn read_json<T: DeserializeOwned>(request: Request) -> Result<T, AppError> {
    let bytes = axum::body::to_bytes(request.into_body(), MAX_BODY_SIZE)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))
}

/// Trimmed, non-empty user id or a 400
pub(crate) fn require_user_id(user_id: Option<&str>) -> Result<&str, AppError> {
    user_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::bad_request("userId is required"))
}
