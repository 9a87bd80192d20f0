//! Request DTOs and body extraction
//!
//! Every field is optional at the serde level so that a missing field and an
//! empty one are reported the same way, through [`Validate`].

use super::error::ApiError;
use crate::domain::banking::{CreditCardApplicationRequest, LoanApplicationRequest, TransferRequest};
use axum::{
    async_trait,
    extract::{FromRequest, Request},
};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// JSON body that rejects with 400 instead of axum's 415/422.
///
/// The content type is not checked; voice bridges are not consistent about it.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read request body: {}", e)))?;

        let value: T = serde_json::from_slice(&bytes).map_err(|e| {
            let mut details = BTreeMap::new();
            details.insert("body".to_string(), e.to_string());
            ApiError {
                details: Some(details),
                ..ApiError::bad_request("Invalid request body")
            }
        })?;

        value.validate()?;
        Ok(JsonBody(value))
    }
}

/// Field-level presence and range checks
pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

/// Collects per-field failures into one 400
#[derive(Default)]
struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    fn require(mut self, field: &str, value: &Option<String>) -> Self {
        if present(value).is_none() {
            self.0.insert(field.to_string(), "is required".to_string());
        }
        self
    }

    fn positive(mut self, field: &str, value: Option<f64>) -> Self {
        match value {
            None => {
                self.0.insert(field.to_string(), "is required".to_string());
            }
            Some(v) if v.is_nan() || v <= 0.0 => {
                self.0
                    .insert(field.to_string(), "must be greater than 0".to_string());
            }
            Some(_) => {}
        }
        self
    }

    fn finish(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::invalid_fields(self.0))
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn owned(value: &Option<String>) -> String {
    present(value).unwrap_or_default().to_string()
}

/// `{call_id, user_id}`, both required
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoadContextRequest {
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl Validate for LoadContextRequest {
    fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::default()
            .require("call_id", &self.call_id)
            .require("user_id", &self.user_id)
            .finish()
    }
}

impl LoadContextRequest {
    pub fn call_id(&self) -> String {
        owned(&self.call_id)
    }

    pub fn user_id(&self) -> String {
        owned(&self.user_id)
    }
}

/// `{user_id, call_id?}`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UserRequest {
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl Validate for UserRequest {
    fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::default()
            .require("user_id", &self.user_id)
            .finish()
    }
}

impl UserRequest {
    pub fn call_id(&self) -> Option<&str> {
        present(&self.call_id)
    }

    pub fn user_id(&self) -> String {
        owned(&self.user_id)
    }
}

/// `{call_id, account_id}` for balances, where the call is required
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BalanceRequest {
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
}

impl Validate for BalanceRequest {
    fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::default()
            .require("call_id", &self.call_id)
            .require("account_id", &self.account_id)
            .finish()
    }
}

impl BalanceRequest {
    pub fn call_id(&self) -> String {
        owned(&self.call_id)
    }

    pub fn account_id(&self) -> String {
        owned(&self.account_id)
    }
}

/// `{account_id, call_id?}`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AccountRequest {
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
}

impl Validate for AccountRequest {
    fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::default()
            .require("account_id", &self.account_id)
            .finish()
    }
}

impl AccountRequest {
    pub fn call_id(&self) -> Option<&str> {
        present(&self.call_id)
    }

    pub fn account_id(&self) -> String {
        owned(&self.account_id)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TransferBody {
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub from_account: Option<String>,
    #[serde(default)]
    pub to_account: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
}

impl Validate for TransferBody {
    fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::default()
            .require("call_id", &self.call_id)
            .require("from_account", &self.from_account)
            .require("to_account", &self.to_account)
            .positive("amount", self.amount)
            .finish()
    }
}

impl TransferBody {
    pub fn call_id(&self) -> String {
        owned(&self.call_id)
    }

    pub fn to_request(&self) -> TransferRequest {
        TransferRequest {
            from_account: owned(&self.from_account),
            to_account: owned(&self.to_account),
            amount: self.amount.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoanBody {
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub loan_amount: Option<f64>,
    #[serde(default)]
    pub loan_purpose: Option<String>,
    #[serde(default)]
    pub term_years: Option<i64>,
}

impl Validate for LoanBody {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::default()
            .require("user_id", &self.user_id)
            .positive("loan_amount", self.loan_amount);
        match self.term_years {
            Some(years) if years > 0 && u32::try_from(years).is_ok() => {}
            Some(_) => {
                errors
                    .0
                    .insert("term_years".to_string(), "must be greater than 0".to_string());
            }
            None => {
                errors
                    .0
                    .insert("term_years".to_string(), "is required".to_string());
            }
        }
        errors.finish()
    }
}

impl LoanBody {
    pub fn call_id(&self) -> Option<&str> {
        present(&self.call_id)
    }

    pub fn to_request(&self) -> LoanApplicationRequest {
        LoanApplicationRequest {
            user_id: owned(&self.user_id),
            loan_amount: self.loan_amount.unwrap_or_default(),
            loan_purpose: owned(&self.loan_purpose),
            term_years: self
                .term_years
                .and_then(|years| u32::try_from(years).ok())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CreditCardBody {
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub card_type: Option<String>,
    #[serde(default)]
    pub credit_limit: Option<f64>,
}

impl Validate for CreditCardBody {
    fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::default()
            .require("user_id", &self.user_id)
            .positive("credit_limit", self.credit_limit)
            .finish()
    }
}

impl CreditCardBody {
    pub fn call_id(&self) -> Option<&str> {
        present(&self.call_id)
    }

    pub fn to_request(&self) -> CreditCardApplicationRequest {
        CreditCardApplicationRequest {
            user_id: owned(&self.user_id),
            card_type: owned(&self.card_type),
            credit_limit: self.credit_limit.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApplicationStatusRequest {
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub application_id: Option<String>,
}

impl Validate for ApplicationStatusRequest {
    fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::default()
            .require("application_id", &self.application_id)
            .finish()
    }
}

impl ApplicationStatusRequest {
    pub fn call_id(&self) -> Option<&str> {
        present(&self.call_id)
    }

    pub fn application_id(&self) -> String {
        owned(&self.application_id)
    }
}

/// `{call_id, state}` where state is e.g. `"SPEAKING_RESPONSE"`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateStateRequest {
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl Validate for UpdateStateRequest {
    fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::default()
            .require("call_id", &self.call_id)
            .require("state", &self.state)
            .finish()
    }
}

impl UpdateStateRequest {
    pub fn call_id(&self) -> String {
        owned(&self.call_id)
    }

    pub fn state(&self) -> String {
        owned(&self.state)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub pin: Option<String>,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::default()
            .require("phone", &self.phone)
            .require("pin", &self.pin)
            .finish()
    }
}

impl LoginRequest {
    pub fn phone(&self) -> String {
        owned(&self.phone)
    }

    pub fn pin(&self) -> String {
        owned(&self.pin)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub token: Option<String>,
}

impl Validate for TokenRequest {
    fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::default()
            .require("token", &self.token)
            .finish()
    }
}

impl TokenRequest {
    pub fn token(&self) -> String {
        owned(&self.token)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub pin: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::default()
            .require("phone", &self.phone)
            .require("pin", &self.pin)
            .require("name", &self.name)
            .finish()
    }
}

impl RegisterRequest {
    pub fn phone(&self) -> String {
        owned(&self.phone)
    }

    pub fn pin(&self) -> String {
        owned(&self.pin)
    }

    pub fn name(&self) -> String {
        owned(&self.name)
    }

    pub fn email(&self) -> String {
        owned(&self.email)
    }
}

/// `{"received": true}`
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// `{"status": "..."}`
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct CallListResponse<T> {
    pub count: usize,
    pub calls: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct StateChangeResponse {
    pub call_id: String,
    pub state: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user_id: String,
    pub name: String,
    pub expires_at: i64,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub valid: bool,
    pub user_id: String,
    pub expires_at: i64,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}
