//! Transaction passthrough handler

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::require_user_id;
use crate::{AppError, AppState};
use recur_core::models::Transaction;

/// Query params for listing provider transactions
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTransactionsQuery {
    pub user_id: Option<String>,
    /// Start date (YYYY-MM-DD), defaults to `summary_days` before `to`
    pub from: Option<NaiveDate>,
    /// End date (YYYY-MM-DD), defaults to today
    pub to: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<Transaction>,
    pub count: usize,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// GET /api/transactions?userId=&from=&to= - Normalized provider transactions
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<TransactionsResponse>, AppError> {
    let user_id = require_user_id(query.user_id.as_deref())?;
    if !state.service.is_live() {
        return Err(AppError::service_unavailable(
            "Banking provider not configured",
        ));
    }

    let to = query.to.unwrap_or_else(|| Utc::now().date_naive());
    let from = query
        .from
        .unwrap_or_else(|| to - Duration::days(state.service.sync_config().summary_days));

    let transactions = state.service.fetch_transactions(user_id, from, to).await?;

    Ok(Json(TransactionsResponse {
        count: transactions.len(),
        transactions,
        from,
        to,
    }))
}
