//! Account handler

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::require_user_id;
use crate::{AppError, AppState};
use recur_core::models::Account;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAccountsQuery {
    pub user_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountsResponse {
    pub accounts: Vec<Account>,
    pub total_balance: f64,
}

/// GET /api/accounts?userId= - Linked accounts with the combined balance
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListAccountsQuery>,
) -> Result<Json<AccountsResponse>, AppError> {
    let user_id = require_user_id(query.user_id.as_deref())?;
    if !state.service.is_live() {
        return Err(AppError::service_unavailable(
            "Banking provider not configured",
        ));
    }

    let accounts = state.service.fetch_accounts(user_id).await?;
    let total_balance = accounts.iter().map(|a| a.balance).sum();

    Ok(Json(AccountsResponse {
        accounts,
        total_balance,
    }))
}
