//! Voice provider webhook processing
//!
//! Only the signature check and payload decoding can fail a delivery. Once an
//! event is accepted, anything that goes wrong while applying it to the call
//! registry is logged and swallowed so the provider never redelivers because
//! of an internal error.

use super::error::{OrchestrationError, WebhookRejection};
use super::signature::SignatureVerifier;
use crate::domain::banking::BankingBackend;
use crate::domain::call::{keys, CallState, CallStateMachine, UNKNOWN_PHONE, UNKNOWN_USER};
use crate::domain::shared::DomainError;
use metrics::counter;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

/// `{"event": "...", "data": {...}}`
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl WebhookEvent {
    fn call_id(&self) -> Result<String, DomainError> {
        self.data
            .get("call_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                DomainError::ValidationError(format!("missing call_id in {} event", self.event))
            })
    }
}

#[derive(Clone)]
pub struct WebhookService {
    calls: CallStateMachine,
    backend: Arc<dyn BankingBackend>,
    verifier: SignatureVerifier,
}

impl WebhookService {
    pub fn new(
        calls: CallStateMachine,
        backend: Arc<dyn BankingBackend>,
        verifier: SignatureVerifier,
    ) -> Self {
        Self {
            calls,
            backend,
            verifier,
        }
    }

    /// Authenticate, decode and apply one delivery
    pub async fn handle(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<(), WebhookRejection> {
        let verified = signature.is_some_and(|sig| self.verifier.verify(body, sig));
        if !verified {
            counter!("webhook_rejected_total", "reason" => "signature").increment(1);
            warn!("Webhook signature verification failed");
            return Err(WebhookRejection::InvalidSignature);
        }

        let event: WebhookEvent = serde_json::from_slice(body).map_err(|e| {
            counter!("webhook_rejected_total", "reason" => "payload").increment(1);
            warn!("Error parsing webhook payload: {}", e);
            WebhookRejection::InvalidPayload(e.to_string())
        })?;

        self.dispatch(event).await;
        Ok(())
    }

    /// Apply an accepted event. Never fails.
    pub async fn dispatch(&self, event: WebhookEvent) {
        counter!("webhook_events_total", "event" => event_label(&event.event)).increment(1);

        let result = match event.event.as_str() {
            "call_started" => self.on_call_started(&event).await,
            "call_ended" => self.on_call_ended(&event).await,
            "call_analyzed" => self.on_call_analyzed(&event).await,
            other => {
                info!("Unknown event type: {}", other);
                Ok(())
            }
        };

        if let Err(e) = result {
            error!("Error processing {} event: {}", event.event, e);
        }
    }

    async fn on_call_started(&self, event: &WebhookEvent) -> Result<(), DomainError> {
        let call_id = event.call_id()?;
        let phone = event
            .data
            .get("phone_number")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_PHONE);

        info!("Call started: {} (Phone: {})", call_id, phone);

        // The caller authenticates later in the call
        self.calls.create_call(&call_id, UNKNOWN_USER, phone).await?;
        self.calls.update_state(&call_id, CallState::CallStarted).await?;
        self.calls
            .update_metadata(&call_id, keys::PROVIDER_DATA, event.data.clone())
            .await
    }

    async fn on_call_ended(&self, event: &WebhookEvent) -> Result<(), DomainError> {
        let call_id = event.call_id()?;
        info!("Call ended: {}", call_id);

        self.calls.update_state(&call_id, CallState::CallEnded).await?;
        self.calls
            .update_metadata(&call_id, keys::END_DATA, event.data.clone())
            .await
    }

    async fn on_call_analyzed(&self, event: &WebhookEvent) -> Result<(), DomainError> {
        let call_id = event.call_id()?;
        info!("Call analyzed: {}", call_id);

        self.calls
            .update_metadata(&call_id, keys::ANALYZED_DATA, event.data.clone())
            .await
    }

    /// Fetch the user and their accounts and cache both on the call.
    ///
    /// Does not change the call's state.
    pub async fn load_user_context(
        &self,
        call_id: &str,
        user_id: &str,
    ) -> Result<(), OrchestrationError> {
        self.attach_user_context(call_id, user_id, None).await
    }

    /// As [`Self::load_user_context`], then move the call to `next_state`.
    ///
    /// The transition is checked before the backend is asked for anything,
    /// and again when the snapshots are written. If it is rejected the call
    /// keeps its user, metadata and state.
    pub async fn load_user_context_and_advance(
        &self,
        call_id: &str,
        user_id: &str,
        next_state: CallState,
    ) -> Result<(), OrchestrationError> {
        self.attach_user_context(call_id, user_id, Some(next_state))
            .await
    }

    async fn attach_user_context(
        &self,
        call_id: &str,
        user_id: &str,
        next_state: Option<CallState>,
    ) -> Result<(), OrchestrationError> {
        // Unknown calls are rejected before any backend round trip
        match next_state {
            Some(next_state) => self.calls.ensure_transition(call_id, next_state).await?,
            None => {
                self.calls.get_call(call_id).await?;
            }
        }

        let user = self.backend.get_user(user_id).await.map_err(|e| {
            error!("Error loading user context: {}", e);
            e
        })?;
        let accounts = self.backend.get_user_accounts(user_id).await.map_err(|e| {
            error!("Error loading user accounts: {}", e);
            e
        })?;
        let account_count = accounts.accounts.len();

        self.calls
            .attach_user(
                call_id,
                user_id,
                vec![(keys::USER, user.into()), (keys::ACCOUNTS, accounts.into())],
                next_state,
            )
            .await?;

        info!(
            "User context loaded for call {} (User: {}, Accounts: {})",
            call_id, user_id, account_count
        );
        Ok(())
    }
}

fn event_label(event: &str) -> &'static str {
    match event {
        "call_started" => "call_started",
        "call_ended" => "call_ended",
        "call_analyzed" => "call_analyzed",
        _ => "unknown",
    }
}
