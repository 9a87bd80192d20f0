//! HTTP client for the banking backend service
//!
//! Every operation goes through [`BackendClient::execute`], which applies one
//! uniform policy: up to `max_retries` extra attempts after the first and a
//! linear sleep before each retry. What gets retried is decided by
//! [`BackendError::is_retryable`].

use super::backoff::{Backoff, LinearBackoff};
use crate::domain::banking::model::UserEnvelope;
use crate::domain::banking::{
    AccountBalance, AccountDetails, AccountStatements, ApplicationStatus, BackendError,
    BankUser, BankingBackend, CreditCardApplication, CreditCardApplicationRequest, HealthStatus,
    LoanApplication, LoanApplicationRequest, TransferReceipt, TransferRequest, UserAccounts,
    UserProfile,
};
use async_trait::async_trait;
use bytes::Bytes;
use metrics::counter;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Connection settings for the backend
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub max_retries: u32,
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            max_retries: 3,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone)]
pub struct BackendClient {
    base_url: Url,
    http: reqwest::Client,
    max_retries: u32,
    backoff: Arc<dyn Backoff>,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Self::with_backoff(config, Arc::new(LinearBackoff::default()))
    }

    pub fn with_backoff(
        config: &BackendConfig,
        backoff: Arc<dyn Backoff>,
    ) -> Result<Self, BackendError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| BackendError::Transport(format!("invalid base url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::Transport(format!(
                "invalid base url: {}",
                config.base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        Ok(Self {
            base_url,
            http,
            max_retries: config.max_retries,
            backoff,
        })
    }

    /// Base URL joined with percent-encoded path segments
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Send a request with retries and return the raw 2xx body
    async fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<Bytes, BackendError> {
        let mut last_error = BackendError::Transport("no attempt made".to_string());

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.backoff.delay(attempt);
                warn!(
                    "Retry attempt {} for {} {} in {:?} ({})",
                    attempt, method, url, delay, last_error
                );
                counter!("backend_retries_total").increment(1);
                tokio::time::sleep(delay).await;
            }

            match self.send_once(&method, &url, body.as_deref()).await {
                Ok(bytes) => {
                    counter!("backend_requests_total", "outcome" => "success").increment(1);
                    debug!("{} {} succeeded on attempt {}", method, url, attempt + 1);
                    return Ok(bytes);
                }
                Err(e) if e.is_retryable() => last_error = e,
                Err(e) => {
                    counter!("backend_requests_total", "outcome" => "failed").increment(1);
                    error!("{} {} failed: {}", method, url, e);
                    return Err(e);
                }
            }
        }

        counter!("backend_requests_total", "outcome" => "exhausted").increment(1);
        error!("{} {} failed: {}", method, url, last_error);
        Err(BackendError::Exhausted {
            attempts: self.max_retries + 1,
            last: Box::new(last_error),
        })
    }

    /// One round trip; non-2xx responses become `Status`
    async fn send_once(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&[u8]>,
    ) -> Result<Bytes, BackendError> {
        let mut request = self.http.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body.to_vec());
        }

        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        Ok(bytes)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, BackendError> {
        let body = self.execute(Method::GET, self.endpoint(segments), None).await?;
        decode(&body)
    }

    async fn post<B, T>(&self, segments: &[&str], payload: &B) -> Result<T, BackendError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let payload =
            serde_json::to_vec(payload).map_err(|e| BackendError::Encode(e.to_string()))?;
        let body = self
            .execute(Method::POST, self.endpoint(segments), Some(payload))
            .await?;
        decode(&body)
    }

    /// Healthy iff the backend reports `status == "healthy"`
    pub async fn is_healthy(&self) -> Result<bool, BackendError> {
        Ok(self.health_check().await?.is_healthy())
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, BackendError> {
    serde_json::from_slice(body).map_err(|e| {
        error!("Error decoding backend response: {}", e);
        BackendError::Decode(e.to_string())
    })
}

#[async_trait]
impl BankingBackend for BackendClient {
    async fn get_user(&self, user_id: &str) -> Result<BankUser, BackendError> {
        let envelope: UserEnvelope = self.get(&["api", "v1", "users", user_id]).await?;
        Ok(envelope.into())
    }

    async fn get_user_profile(&self, user_id: &str) -> Result<UserProfile, BackendError> {
        self.get(&["api", "v1", "users", user_id, "profile"]).await
    }

    async fn get_user_accounts(&self, user_id: &str) -> Result<UserAccounts, BackendError> {
        self.get(&["api", "v1", "users", user_id, "accounts"]).await
    }

    async fn get_account(&self, account_id: &str) -> Result<AccountDetails, BackendError> {
        self.get(&["api", "v1", "accounts", account_id]).await
    }

    async fn get_account_balance(&self, account_id: &str) -> Result<AccountBalance, BackendError> {
        self.get(&["api", "v1", "accounts", account_id, "balance"])
            .await
    }

    async fn get_account_statements(
        &self,
        account_id: &str,
    ) -> Result<AccountStatements, BackendError> {
        self.get(&["api", "v1", "accounts", account_id, "statements"])
            .await
    }

    async fn transfer_funds(
        &self,
        request: TransferRequest,
    ) -> Result<TransferReceipt, BackendError> {
        self.post(&["api", "v1", "payments", "transfer"], &request)
            .await
    }

    async fn apply_for_loan(
        &self,
        request: LoanApplicationRequest,
    ) -> Result<LoanApplication, BackendError> {
        self.post(&["api", "v1", "applications", "loan"], &request)
            .await
    }

    async fn apply_for_credit_card(
        &self,
        request: CreditCardApplicationRequest,
    ) -> Result<CreditCardApplication, BackendError> {
        self.post(&["api", "v1", "applications", "credit-card"], &request)
            .await
    }

    async fn get_application_status(
        &self,
        application_id: &str,
    ) -> Result<ApplicationStatus, BackendError> {
        self.get(&["api", "v1", "applications", application_id])
            .await
    }

    async fn health_check(&self) -> Result<HealthStatus, BackendError> {
        self.get(&["health"]).await
    }
}
