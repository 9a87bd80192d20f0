//! Orchestration endpoints used by the voice bridge mid-call
//!
//! Handlers that touch the backend on behalf of a call move it to
//! `PROCESSING_REQUEST` first and to `GENERATING_RESPONSE` on success. A
//! rejected first transition aborts the request before the backend is
//! called. A backend failure leaves the call in `PROCESSING_REQUEST`.

use super::dto::{
    AccountRequest, ApplicationStatusRequest, BalanceRequest, CreditCardBody, JsonBody,
    LoadContextRequest, LoanBody, StateChangeResponse, StatusResponse, TransferBody,
    UpdateStateRequest, UserRequest,
};
use super::error::ApiError;
use super::state::AppState;
use crate::domain::banking::{
    AccountBalance, AccountDetails, AccountStatements, ApplicationStatus, BankUser, CreditCardApplication,
    LoanApplication, TransferReceipt, UserAccounts, UserProfile,
};
use crate::domain::call::{keys, CallState, MetadataValue};
use axum::{extract::State, Json};
use std::collections::BTreeMap;
use tracing::{info, warn};

async fn begin_request(state: &AppState, call_id: Option<&str>) -> Result<(), ApiError> {
    if let Some(call_id) = call_id {
        state
            .calls
            .update_state(call_id, CallState::ProcessingRequest)
            .await?;
    }
    Ok(())
}

/// The backend work has already happened, so a rejected transition here is
/// logged rather than turned into an error response
async fn finish_request(state: &AppState, call_id: Option<&str>) {
    if let Some(call_id) = call_id {
        if let Err(e) = state
            .calls
            .update_state(call_id, CallState::GeneratingResponse)
            .await
        {
            warn!("Call {} not advanced after backend success: {}", call_id, e);
        }
    }
}

async fn remember(
    state: &AppState,
    call_id: Option<&str>,
    key: &str,
    value: impl Into<MetadataValue>,
) {
    if let Some(call_id) = call_id {
        if let Err(e) = state.calls.update_metadata(call_id, key, value).await {
            warn!("Could not cache {} for call {}: {}", key, call_id, e);
        }
    }
}

/// Load user and accounts into the call, then wait for an intent
pub async fn load_context(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoadContextRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let (call_id, user_id) = (req.call_id(), req.user_id());
    info!("API: Loading context for call {} (User: {})", call_id, user_id);

    state
        .webhooks
        .load_user_context_and_advance(&call_id, &user_id, CallState::AwaitingIntent)
        .await?;

    Ok(Json(StatusResponse {
        status: "context loaded".to_string(),
    }))
}

pub async fn get_user(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<UserRequest>,
) -> Result<Json<BankUser>, ApiError> {
    let user_id = req.user_id();
    info!("API: Getting user {}", user_id);

    let user = state
        .backend
        .get_user(&user_id)
        .await
        .map_err(|e| ApiError::backend("get user", e))?;

    remember(&state, req.call_id(), keys::USER, user.clone()).await;
    Ok(Json(user))
}

pub async fn get_user_profile(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<UserRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let user_id = req.user_id();
    info!("API: Getting profile for user {}", user_id);

    let profile = state
        .backend
        .get_user_profile(&user_id)
        .await
        .map_err(|e| ApiError::backend("get user profile", e))?;

    Ok(Json(profile))
}

pub async fn get_accounts(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<UserRequest>,
) -> Result<Json<UserAccounts>, ApiError> {
    let user_id = req.user_id();
    info!("API: Getting accounts for user {}", user_id);

    let accounts = state
        .backend
        .get_user_accounts(&user_id)
        .await
        .map_err(|e| ApiError::backend("get user accounts", e))?;

    remember(&state, req.call_id(), keys::ACCOUNTS, accounts.clone()).await;
    Ok(Json(accounts))
}

/// Account type and balance together; same call handling as statements
pub async fn get_account(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<AccountRequest>,
) -> Result<Json<AccountDetails>, ApiError> {
    let account_id = req.account_id();
    info!("API: Getting account {}", account_id);

    begin_request(&state, req.call_id()).await?;

    let account = state
        .backend
        .get_account(&account_id)
        .await
        .map_err(|e| ApiError::backend("get account", e))?;

    finish_request(&state, req.call_id()).await;
    Ok(Json(account))
}

pub async fn get_balance(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<BalanceRequest>,
) -> Result<Json<AccountBalance>, ApiError> {
    let (call_id, account_id) = (req.call_id(), req.account_id());
    info!("API: Getting balance of {} for call {}", account_id, call_id);

    begin_request(&state, Some(&call_id)).await?;

    let balance = state
        .backend
        .get_account_balance(&account_id)
        .await
        .map_err(|e| ApiError::backend("get account balance", e))?;

    finish_request(&state, Some(&call_id)).await;
    Ok(Json(balance))
}

pub async fn get_statements(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<AccountRequest>,
) -> Result<Json<AccountStatements>, ApiError> {
    let account_id = req.account_id();
    info!("API: Getting statements of {}", account_id);

    begin_request(&state, req.call_id()).await?;

    let statements = state
        .backend
        .get_account_statements(&account_id)
        .await
        .map_err(|e| ApiError::backend("get account statements", e))?;

    finish_request(&state, req.call_id()).await;
    Ok(Json(statements))
}

pub async fn transfer(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<TransferBody>,
) -> Result<Json<TransferReceipt>, ApiError> {
    let call_id = req.call_id();
    let transfer = req.to_request();
    info!(
        "API: Transferring {:.2} from {} to {} for call {}",
        transfer.amount, transfer.from_account, transfer.to_account, call_id
    );

    begin_request(&state, Some(&call_id)).await?;

    let receipt = state
        .backend
        .transfer_funds(transfer)
        .await
        .map_err(|e| ApiError::backend("transfer funds", e))?;

    finish_request(&state, Some(&call_id)).await;
    Ok(Json(receipt))
}

pub async fn apply_loan(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoanBody>,
) -> Result<Json<LoanApplication>, ApiError> {
    let application = req.to_request();
    info!(
        "API: Loan application for user {} ({:.2} over {} years)",
        application.user_id, application.loan_amount, application.term_years
    );

    begin_request(&state, req.call_id()).await?;

    let submitted = state
        .backend
        .apply_for_loan(application)
        .await
        .map_err(|e| ApiError::backend("apply for loan", e))?;

    finish_request(&state, req.call_id()).await;
    remember(
        &state,
        req.call_id(),
        keys::APPLICATION_ID,
        MetadataValue::ApplicationId(submitted.application_id.clone()),
    )
    .await;
    Ok(Json(submitted))
}

pub async fn apply_credit_card(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreditCardBody>,
) -> Result<Json<CreditCardApplication>, ApiError> {
    let application = req.to_request();
    info!(
        "API: Credit card application for user {} ({})",
        application.user_id, application.card_type
    );

    begin_request(&state, req.call_id()).await?;

    let submitted = state
        .backend
        .apply_for_credit_card(application)
        .await
        .map_err(|e| ApiError::backend("apply for credit card", e))?;

    finish_request(&state, req.call_id()).await;
    remember(
        &state,
        req.call_id(),
        keys::APPLICATION_ID,
        MetadataValue::ApplicationId(submitted.application_id.clone()),
    )
    .await;
    Ok(Json(submitted))
}

pub async fn get_application_status(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ApplicationStatusRequest>,
) -> Result<Json<ApplicationStatus>, ApiError> {
    let application_id = req.application_id();
    info!("API: Getting status of application {}", application_id);

    begin_request(&state, req.call_id()).await?;

    let status = state
        .backend
        .get_application_status(&application_id)
        .await
        .map_err(|e| ApiError::backend("get application status", e))?;

    finish_request(&state, req.call_id()).await;
    Ok(Json(status))
}

/// Drive the transitions the backend handlers do not, e.g.
/// `SPEAKING_RESPONSE` and back to `AWAITING_INTENT`
pub async fn update_state(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<UpdateStateRequest>,
) -> Result<Json<StateChangeResponse>, ApiError> {
    let call_id = req.call_id();
    let target: CallState = req.state().parse().map_err(|e: String| {
        let mut details = BTreeMap::new();
        details.insert("state".to_string(), e);
        ApiError::invalid_fields(details)
    })?;

    info!("API: Moving call {} to {}", call_id, target);
    state.calls.update_state(&call_id, target).await?;

    Ok(Json(StateChangeResponse {
        call_id,
        state: target.to_string(),
    }))
}
