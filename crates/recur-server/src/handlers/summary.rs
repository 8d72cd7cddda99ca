//! Spend summary handler

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::require_user_id;
use crate::{AppError, AppState};
use recur_core::SpendSummary;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryQuery {
    pub user_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub summary: SpendSummary,
    /// Percent change in expenses against the previous window
    pub change_percentage: Option<f64>,
}

/// GET /api/summary?userId= - Recent spending by category, income and subscription load
pub async fn spend_summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<SummaryResponse>, AppError> {
    let user_id = require_user_id(query.user_id.as_deref())?;

    let summary = state.service.spend_summary(user_id)?;
    let change_percentage = summary.change_percentage();

    Ok(Json(SummaryResponse {
        summary,
        change_percentage,
    }))
}
