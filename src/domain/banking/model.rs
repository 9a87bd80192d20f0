//! Snapshots of users, accounts, payments and applications as reported by
//! the backend service

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// User record from `GET /api/v1/users/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankUser {
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub date_of_birth: String,
    #[serde(default)]
    pub accounts: Vec<String>,
}

/// Wire envelope: `{"user_id": ..., "details": {...}}`
#[derive(Debug, Deserialize)]
pub(crate) struct UserEnvelope {
    pub user_id: String,
    pub details: UserDetails,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserDetails {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub date_of_birth: String,
    #[serde(default)]
    pub accounts: Vec<String>,
}

impl From<UserEnvelope> for BankUser {
    fn from(e: UserEnvelope) -> Self {
        BankUser {
            user_id: e.user_id,
            name: e.details.name,
            email: e.details.email,
            phone: e.details.phone,
            address: e.details.address,
            date_of_birth: e.details.date_of_birth,
            accounts: e.details.accounts,
        }
    }
}

/// Non-sensitive profile from `GET /api/v1/users/{id}/profile`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// One account as embedded in user/account responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSummary {
    #[serde(default)]
    pub balance: f64,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
    #[serde(default, deserialize_with = "stringly_map")]
    pub statements: BTreeMap<String, String>,
}

/// `GET /api/v1/users/{id}/accounts`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccounts {
    pub user_id: String,
    #[serde(default)]
    pub account_count: usize,
    #[serde(default)]
    pub accounts: BTreeMap<String, AccountSummary>,
}

/// `GET /api/v1/accounts/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountDetails {
    pub account_id: String,
    pub details: AccountSummary,
}

/// `GET /api/v1/accounts/{id}/balance`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub account_id: String,
    pub balance: f64,
}

/// `GET /api/v1/accounts/{id}/statements`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountStatements {
    pub account_id: String,
    #[serde(default, deserialize_with = "stringly_map")]
    pub statements: BTreeMap<String, String>,
}

/// Body of `POST /api/v1/payments/transfer`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub from_account: String,
    pub to_account: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub payment_id: String,
    pub from_account: String,
    pub to_account: String,
    pub amount: f64,
    pub status: String,
}

/// Body of `POST /api/v1/applications/loan`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplicationRequest {
    pub user_id: String,
    pub loan_amount: f64,
    pub loan_purpose: String,
    pub term_years: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub application_id: String,
    pub status: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub loan_amount: f64,
    #[serde(default)]
    pub loan_purpose: String,
    #[serde(default)]
    pub term_years: u32,
    #[serde(default)]
    pub message: String,
}

/// Body of `POST /api/v1/applications/credit-card`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditCardApplicationRequest {
    pub user_id: String,
    pub card_type: String,
    pub credit_limit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditCardApplication {
    pub application_id: String,
    pub status: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub card_type: String,
    #[serde(default)]
    pub credit_limit: f64,
    #[serde(default)]
    pub message: String,
}

/// `GET /api/v1/applications/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationStatus {
    pub application_id: String,
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub version: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

// Statement values are free-form on the wire; keep them as display strings.
fn stringly_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| {
            let text = match v {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (k, text)
        })
        .collect())
}
