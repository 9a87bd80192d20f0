//! Voice provider webhook endpoint

use super::dto::WebhookAck;
use super::error::ApiError;
use super::state::AppState;
use crate::application::{WebhookRejection, SIGNATURE_HEADER};
use axum::{
    extract::{rejection::BytesRejection, State},
    http::HeaderMap,
    Json,
};
use bytes::Bytes;
use tracing::warn;

/// Largest webhook body accepted
pub const WEBHOOK_BODY_LIMIT: usize = 1024 * 1024;

/// Acknowledges with 200 once the signature checks out, whatever happens
/// while applying the event
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<WebhookAck>, ApiError> {
    let body = body.map_err(|e| {
        warn!("Error reading webhook body: {}", e);
        ApiError::bad_request("Failed to read request body")
    })?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    match state.webhooks.handle(&body, signature).await {
        Ok(()) => Ok(Json(WebhookAck { received: true })),
        Err(WebhookRejection::InvalidSignature) => Err(ApiError::unauthorized("Unauthorized")),
        Err(WebhookRejection::InvalidPayload(_)) => Err(ApiError::bad_request("Invalid JSON")),
    }
}
