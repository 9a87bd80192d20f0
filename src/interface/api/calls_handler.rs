//! Read-only call inspection and health

use super::dto::{CallListResponse, HealthResponse};
use super::error::ApiError;
use super::state::AppState;
use crate::domain::call::CallContext;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct CallQuery {
    pub call_id: Option<String>,
}

/// All calls, oldest first
pub async fn list_calls(State(state): State<AppState>) -> Json<CallListResponse<CallContext>> {
    info!("API: Getting all calls");

    let mut calls = state.calls.get_all_calls().await;
    calls.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.call_id.cmp(&b.call_id))
    });

    Json(CallListResponse {
        count: calls.len(),
        calls,
    })
}

pub async fn get_call(
    State(state): State<AppState>,
    Query(query): Query<CallQuery>,
) -> Result<Json<CallContext>, ApiError> {
    let call_id = query
        .call_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing call_id parameter"))?;

    info!("API: Getting call {}", call_id);

    let call = state
        .calls
        .get_call(&call_id)
        .await
        .map_err(|e| ApiError::not_found(format!("Call not found: {}", e)))?;

    Ok(Json(call))
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
    })
}
