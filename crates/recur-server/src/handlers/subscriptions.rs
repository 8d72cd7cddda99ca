//! Subscription handlers

use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{read_json, require_user_id};
use crate::{AppError, AppState, SuccessResponse};
use recur_core::{models::Subscription, monthly_cost};

/// Query params for listing subscriptions
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSubscriptionsQuery {
    pub user_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionsResponse {
    pub subscriptions: Vec<Subscription>,
    pub monthly_cost: f64,
}

/// GET /api/subscriptions?userId= - Active subscriptions and their monthly cost
pub async fn list_subscriptions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListSubscriptionsQuery>,
) -> Result<Json<SubscriptionsResponse>, AppError> {
    let user_id = require_user_id(query.user_id.as_deref())?;

    let subscriptions = state.service.list_subscriptions(user_id)?;
    let monthly_cost = monthly_cost(&subscriptions);

    Ok(Json(SubscriptionsResponse {
        subscriptions,
        monthly_cost,
    }))
}

/// Request body for removing a subscription
#[derive(Debug, Deserialize)]
pub struct DeleteSubscriptionRequest {
    pub id: Option<i64>,
}

/// DELETE /api/subscriptions - Stop tracking a subscription (soft delete)
pub async fn delete_subscription(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<SuccessResponse>, AppError> {
    let req: DeleteSubscriptionRequest = read_json(request).await?;
    let id = req
        .id
        .ok_or_else(|| AppError::bad_request("Subscription id is required"))?;

    state.service.remove_subscription(id)?;
    info!(id, "Subscription removed via API");

    Ok(Json(SuccessResponse { success: true }))
}
