//! PIN login and session endpoints

use super::dto::{
    JsonBody, LoginRequest, LoginResponse, MessageResponse, RegisterRequest, SessionResponse,
    TokenRequest,
};
use super::error::ApiError;
use super::state::AppState;
use crate::domain::auth::RegisteredUser;
use axum::{extract::State, http::StatusCode, Json};
use tracing::{error, info};

pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let phone = req.phone();
    info!("API: Login attempt for {}", phone);

    let outcome = state.auth.login(&phone, &req.pin()).await?;

    Ok(Json(LoginResponse {
        success: true,
        token: outcome.token,
        user_id: outcome.user_id,
        name: outcome.name,
        expires_at: outcome.expires_at,
        message: "Login successful".to_string(),
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<TokenRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.auth.logout(&req.token()).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Logged out".to_string(),
    }))
}

pub async fn validate(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<TokenRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.auth.validate_token(&req.token()).await?;

    Ok(Json(SessionResponse {
        valid: true,
        user_id: session.user_id,
        expires_at: session.expires_at,
    }))
}

pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisteredUser>), ApiError> {
    info!("API: Registering user {}", req.phone());

    match state
        .auth
        .register_user(&req.phone(), &req.pin(), &req.name(), &req.email())
        .await
    {
        Ok(registered) => {
            info!(
                "API: Registered user {} (ID: {})",
                registered.user.name, registered.user.user_id
            );
            Ok((StatusCode::CREATED, Json(registered)))
        }
        Err(e) => {
            error!("API: Failed to register user: {}", e);
            Err(e.into())
        }
    }
}
