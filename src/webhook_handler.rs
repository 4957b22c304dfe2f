use crate::errors::WebhookError;
use crate::handlers::AppState;
use crate::webhook_models::{SaleTransactionRecord, WebhookPayload, WebhookResponse};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use std::sync::Arc;

/// PayT Webhook Handler
///
/// Receives sale notifications from PayT and appends one row to `payt_vendas` per call.
///
/// Expected payload: flat JSON object OR url-encoded form
/// Authentication: none; PAYT_SECRET_KEY is loaded but not checked
pub async fn payt_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<WebhookResponse>), WebhookError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    // 1. Decode body (JSON or form)
    let payload = WebhookPayload::parse(content_type, &body)?;
    tracing::info!("📨 Received PayT webhook with {} field(s)", payload.0.len());
    tracing::debug!("PayT payload: {:?}", payload.0);

    // 2. Connectivity-test pings arrive empty
    if payload.is_empty() {
        tracing::warn!("⚠️  Empty webhook, ignoring...");
        return Ok((StatusCode::OK, Json(WebhookResponse::ignored())));
    }

    // 3. Map provider fields to canonical columns
    let record = SaleTransactionRecord::from_payload(&payload, Utc::now())?;

    // 4. Append (no dedup: provider retries produce extra rows)
    state.storage.insert_sale(&record).await?;

    tracing::info!(
        "✅ Inserted PayT transaction {:?} into {} ({})",
        record.transaction_id,
        crate::storage::SALES_TABLE,
        state.storage.backend_name()
    );

    Ok((
        StatusCode::OK,
        Json(WebhookResponse::success(record.transaction_id)),
    ))
}
