//! Shared handler state

use crate::application::{SignatureVerifier, WebhookService};
use crate::domain::auth::AuthService;
use crate::domain::banking::BankingBackend;
use crate::domain::call::CallStateMachine;
use std::sync::Arc;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub calls: CallStateMachine,
    pub backend: Arc<dyn BankingBackend>,
    pub webhooks: WebhookService,
    pub auth: Arc<AuthService>,
    pub version: String,
}

impl AppState {
    pub fn new(
        calls: CallStateMachine,
        backend: Arc<dyn BankingBackend>,
        verifier: SignatureVerifier,
        auth: Arc<AuthService>,
    ) -> Self {
        let webhooks = WebhookService::new(calls.clone(), backend.clone(), verifier);
        Self {
            calls,
            backend,
            webhooks,
            auth,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
