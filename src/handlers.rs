use crate::config::Config;
use crate::storage::Storage;
use crate::webhook_handler;
use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

pub const SERVICE_NAME: &str = "PayT Webhook";
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Largest accepted webhook body.
pub const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Backing store for sale rows.
    pub storage: Arc<dyn Storage>,
}

/// Builds the HTTP surface: service metadata, health check and the PayT webhook.
///
/// Rate limiting is layered on by the binary, since it needs the peer address.
pub fn router(state: Arc<AppState>) -> Router {
    let webhook_routes = Router::new()
        .route("/webhook/payt", post(webhook_handler::payt_webhook))
        // Request size limit: 5MB max payload, for both the layer and the Bytes extractor
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
        );

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .merge(webhook_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Root endpoint.
///
/// Lists the service name, version, listening port and routes.
pub async fn index(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "service": "PayT Webhook Server",
            "version": SERVICE_VERSION,
            "port": state.config.port,
            "endpoints": {
                "/webhook/payt": "POST - Receive PayT webhooks",
                "/health": "GET - Health check"
            }
        })),
    )
}

/// Health check endpoint.
///
/// Always reports healthy; storage reachability is not probed.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": SERVICE_NAME,
            "timestamp": Utc::now().to_rfc3339()
        })),
    )
}
