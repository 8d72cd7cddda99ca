//! Sync handler

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{read_json, require_user_id};
use crate::{AppError, AppState};
use recur_core::models::SyncSummary;

/// Request body for a sync
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub user_id: Option<String>,
}

#[derive(Serialize)]
pub struct SyncResponse {
    pub success: bool,
    pub data: SyncSummary,
}

/// POST /api/sync - Fetch, reconcile and detect for one provider user
///
/// The whole sync is bounded by the configured sync timeout (504 when hit).
pub async fn sync_user(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<SyncResponse>, AppError> {
    let req: SyncRequest = read_json(request).await?;
    let user_id = require_user_id(req.user_id.as_deref())?;

    let timeout = state.service.sync_config().timeout;
    let summary = match tokio::time::timeout(timeout, state.service.sync(user_id)).await {
        Ok(result) => result?,
        Err(_) => {
            warn!(user = %user_id, timeout_secs = timeout.as_secs(), "Sync timed out");
            return Err(AppError::gateway_timeout("Sync timed out"));
        }
    };

    info!(
        user = %user_id,
        mode = ?summary.mode,
        added = summary.transactions_added,
        detected = summary.subscriptions_detected,
        "Sync served"
    );

    Ok(Json(SyncResponse {
        success: true,
        data: summary,
    }))
}
