//! Shared fixtures for the API integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt; // For `oneshot`
use voicebank::application::SignatureVerifier;
use voicebank::domain::auth::AuthService;
use voicebank::domain::banking::{
    AccountBalance, AccountDetails, AccountStatements, AccountSummary, ApplicationStatus,
    BackendError, BankUser, BankingBackend, CreditCardApplication, CreditCardApplicationRequest,
    HealthStatus, LoanApplication, LoanApplicationRequest, TransferReceipt, TransferRequest,
    UserAccounts, UserProfile,
};
use voicebank::domain::call::{CallState, CallStateMachine, UNKNOWN_USER};
use voicebank::infrastructure::persistence::MemoryUserRepository;
use voicebank::interface::api::{build_router, AppState};

pub const API_KEY: &str = "test-api-key";

/// Backend double that records every operation it is asked to perform
#[derive(Default)]
pub struct StubBackend {
    invocations: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl StubBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every operation fails as if retries were exhausted
    pub fn failing() -> Arc<Self> {
        let backend = Self::default();
        backend.failing.store(true, Ordering::SeqCst);
        Arc::new(backend)
    }

    pub fn invocations(&self) -> Vec<String> {
        self.invocations.lock().unwrap().clone()
    }

    fn record(&self, operation: &str) -> Result<(), BackendError> {
        self.invocations.lock().unwrap().push(operation.to_string());
        if self.failing.load(Ordering::SeqCst) {
            return Err(BackendError::Exhausted {
                attempts: 4,
                last: Box::new(BackendError::Status {
                    status: 503,
                    body: "unavailable".into(),
                }),
            });
        }
        Ok(())
    }
}

pub fn sample_user(user_id: &str) -> BankUser {
    BankUser {
        user_id: user_id.to_string(),
        name: "Alice Johnson".into(),
        email: "alice@example.com".into(),
        phone: "+14155552671".into(),
        address: "1 Market St".into(),
        date_of_birth: "1985-04-12".into(),
        accounts: vec!["acc-1".into(), "acc-2".into()],
    }
}

fn summary(balance: f64, account_type: &str) -> AccountSummary {
    AccountSummary {
        balance,
        account_type: Some(account_type.to_string()),
        statements: BTreeMap::new(),
    }
}

#[async_trait]
impl BankingBackend for StubBackend {
    async fn get_user(&self, user_id: &str) -> Result<BankUser, BackendError> {
        self.record("get_user")?;
        Ok(sample_user(user_id))
    }

    async fn get_user_profile(&self, user_id: &str) -> Result<UserProfile, BackendError> {
        self.record("get_user_profile")?;
        Ok(UserProfile {
            user_id: user_id.to_string(),
            name: Some("Alice Johnson".into()),
            email: Some("alice@example.com".into()),
            phone: None,
            address: None,
        })
    }

    async fn get_user_accounts(&self, user_id: &str) -> Result<UserAccounts, BackendError> {
        self.record("get_user_accounts")?;
        let mut accounts = BTreeMap::new();
        accounts.insert("acc-1".to_string(), summary(1250.75, "checking"));
        accounts.insert("acc-2".to_string(), summary(8000.0, "savings"));
        Ok(UserAccounts {
            user_id: user_id.to_string(),
            account_count: accounts.len(),
            accounts,
        })
    }

    async fn get_account(&self, account_id: &str) -> Result<AccountDetails, BackendError> {
        self.record("get_account")?;
        Ok(AccountDetails {
            account_id: account_id.to_string(),
            details: summary(1250.75, "checking"),
        })
    }

    async fn get_account_balance(&self, account_id: &str) -> Result<AccountBalance, BackendError> {
        self.record("get_account_balance")?;
        Ok(AccountBalance {
            account_id: account_id.to_string(),
            balance: 1250.75,
        })
    }

    async fn get_account_statements(
        &self,
        account_id: &str,
    ) -> Result<AccountStatements, BackendError> {
        self.record("get_account_statements")?;
        let mut statements = BTreeMap::new();
        statements.insert("2024-01".to_string(), "statement-2024-01.pdf".to_string());
        Ok(AccountStatements {
            account_id: account_id.to_string(),
            statements,
        })
    }

    async fn transfer_funds(
        &self,
        request: TransferRequest,
    ) -> Result<TransferReceipt, BackendError> {
        self.record("transfer_funds")?;
        Ok(TransferReceipt {
            payment_id: "pay-1".into(),
            from_account: request.from_account,
            to_account: request.to_account,
            amount: request.amount,
            status: "completed".into(),
        })
    }

    async fn apply_for_loan(
        &self,
        request: LoanApplicationRequest,
    ) -> Result<LoanApplication, BackendError> {
        self.record("apply_for_loan")?;
        Ok(LoanApplication {
            application_id: "LOAN_1".into(),
            status: "submitted".into(),
            user_id: request.user_id,
            loan_amount: request.loan_amount,
            loan_purpose: request.loan_purpose,
            term_years: request.term_years,
            message: "Loan application submitted".into(),
        })
    }

    async fn apply_for_credit_card(
        &self,
        request: CreditCardApplicationRequest,
    ) -> Result<CreditCardApplication, BackendError> {
        self.record("apply_for_credit_card")?;
        Ok(CreditCardApplication {
            application_id: "CC_1".into(),
            status: "submitted".into(),
            user_id: request.user_id,
            card_type: request.card_type,
            credit_limit: request.credit_limit,
            message: "Credit card application submitted".into(),
        })
    }

    async fn get_application_status(
        &self,
        application_id: &str,
    ) -> Result<ApplicationStatus, BackendError> {
        self.record("get_application_status")?;
        Ok(ApplicationStatus {
            application_id: application_id.to_string(),
            status: "under_review".into(),
            message: "Your application is being reviewed".into(),
        })
    }

    async fn health_check(&self) -> Result<HealthStatus, BackendError> {
        self.record("health_check")?;
        Ok(HealthStatus {
            status: "healthy".into(),
            version: "0.1.0".into(),
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub calls: CallStateMachine,
    pub backend: Arc<StubBackend>,
    pub users: Arc<MemoryUserRepository>,
}

impl TestApp {
    pub fn new(backend: Arc<StubBackend>) -> Self {
        let calls = CallStateMachine::new();
        let users = Arc::new(MemoryUserRepository::new());
        let state = AppState::new(
            calls.clone(),
            backend.clone(),
            SignatureVerifier::new(API_KEY),
            Arc::new(AuthService::new(users.clone())),
        );
        let router = build_router(state, None, Duration::from_secs(30));
        Self {
            router,
            calls,
            backend,
            users,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(post_json(uri, &body)).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    /// A call that has been answered and had its context loaded
    pub async fn call_awaiting_intent(&self, call_id: &str) {
        self.calls
            .create_call(call_id, UNKNOWN_USER, "+14155552671")
            .await
            .unwrap();
        self.calls
            .update_state(call_id, CallState::CallStarted)
            .await
            .unwrap();
        self.calls
            .update_state(call_id, CallState::AwaitingIntent)
            .await
            .unwrap();
    }

    pub async fn state_of(&self, call_id: &str) -> CallState {
        self.calls.get_call(call_id).await.unwrap().state
    }
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn sign_with(key: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(key.as_bytes()).unwrap();
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

pub fn sign(body: &[u8]) -> String {
    sign_with(API_KEY, body)
}

/// Webhook request signed with `key`
pub fn webhook_request(key: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .header("X-Retell-Signature", sign_with(key, body.as_bytes()))
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn event(name: &str, data: Value) -> String {
    json!({"event": name, "data": data}).to_string()
}
