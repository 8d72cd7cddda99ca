//! Recur Web Server
//!
//! Axum-based REST API over the sync engine.
//!
//! - `POST /api/sync` runs a full sync for a provider user
//! - subscriptions, spend summary, transactions and accounts endpoints for the dashboard
//! - restrictive CORS and security headers
//! - sanitized error responses

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use recur_core::{Error as CoreError, SyncService};

mod handlers;

/// Maximum accepted JSON request body (bytes)
pub const MAX_BODY_SIZE: usize = 16 * 1024;

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

/// Shared application state
pub struct AppState {
    pub service: SyncService,
}

/// Success response
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Create the application router
pub fn create_router(service: SyncService, config: ServerConfig) -> Router {
    match service.provider_name() {
        Some(provider) => info!(provider, "Banking provider configured"),
        None => info!("ℹ️  Banking provider not configured (set BASIQ_API_KEY), serving demo data"),
    }

    let state = Arc::new(AppState { service });

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/sync", post(handlers::sync_user))
        .route(
            "/subscriptions",
            get(handlers::list_subscriptions).delete(handlers::delete_subscription),
        )
        .route("/summary", get(handlers::spend_summary))
        .route("/transactions", get(handlers::list_transactions))
        .route("/accounts", get(handlers::list_accounts));

    let methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];
    let cors = if config.allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE])
    };

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
}

/// Start the server
pub async fn serve(
    service: SyncService,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if !service.has_store() {
        warn!("⚠️  No local store, sync results will not be persisted");
    }

    let app = create_router(service, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    fn with_status(status: StatusCode, msg: &str) -> Self {
        Self {
            status,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn bad_request(msg: &str) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, msg)
    }

    pub fn service_unavailable(msg: &str) -> Self {
        Self::with_status(StatusCode::SERVICE_UNAVAILABLE, msg)
    }

    pub fn gateway_timeout(msg: &str) -> Self {
        Self::with_status(StatusCode::GATEWAY_TIMEOUT, msg)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "success": false,
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();

        // Caller-facing core errors keep their message
        let status = match err.downcast_ref::<CoreError>() {
            Some(CoreError::ProviderUnavailable(_)) => Some(StatusCode::BAD_GATEWAY),
            Some(CoreError::InvalidData(_)) => Some(StatusCode::BAD_REQUEST),
            Some(CoreError::NotFound(_)) => Some(StatusCode::NOT_FOUND),
            _ => None,
        };
        if let Some(status) = status {
            warn!(status = status.as_u16(), error = %err, "Request failed");
            return Self::with_status(status, &err.to_string());
        }

        if err.downcast_ref::<CoreError>().is_some_and(CoreError::is_storage) {
            return Self {
                status: StatusCode::SERVICE_UNAVAILABLE,
                message: "Storage unavailable".to_string(),
                internal: Some(err),
            };
        }

        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}

#[cfg(test)]
mod tests;
