//! Registry of in-flight calls
//!
//! Every state change in the service goes through [`CallStateMachine::update_state`],
//! which checks the transition table under the write lock. Two racing
//! transitions on the same call are therefore serialized and the loser sees
//! `InvalidStateTransition` instead of silently overwriting the winner.
//!
//! Reads hand out clones so callers never hold the lock or observe a context
//! mid-mutation.

use super::entity::{CallContext, MetadataValue};
use super::value_object::CallState;
use crate::domain::shared::error::{DomainError, Result};
use chrono::Utc;
use metrics::counter;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Concurrency-safe call registry. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct CallStateMachine {
    calls: Arc<RwLock<HashMap<String, CallContext>>>,
}

impl CallStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new call in `AWAITING_CALL`
    pub async fn create_call(
        &self,
        call_id: &str,
        user_id: &str,
        phone_number: &str,
    ) -> Result<CallContext> {
        let mut calls = self.calls.write().await;

        if calls.contains_key(call_id) {
            return Err(DomainError::AlreadyExists(format!("call {}", call_id)));
        }

        let call = CallContext::new(
            call_id.to_string(),
            user_id.to_string(),
            phone_number.to_string(),
        );
        calls.insert(call_id.to_string(), call.clone());

        info!(
            "Call created: {} (User: {}, Phone: {})",
            call_id, user_id, phone_number
        );
        Ok(call)
    }

    pub async fn get_call(&self, call_id: &str) -> Result<CallContext> {
        let calls = self.calls.read().await;
        calls
            .get(call_id)
            .cloned()
            .ok_or_else(|| DomainError::NotFound(format!("call {}", call_id)))
    }

    /// Move a call to `new_state` if the transition table allows it
    pub async fn update_state(&self, call_id: &str, new_state: CallState) -> Result<()> {
        let mut calls = self.calls.write().await;

        let call = calls
            .get_mut(call_id)
            .ok_or_else(|| DomainError::NotFound(format!("call {}", call_id)))?;

        check_transition(call_id, call, new_state)?;
        apply_transition(call_id, call, new_state);
        Ok(())
    }

    /// Fail unless the call exists and may move to `new_state`. Nothing is
    /// written.
    pub async fn ensure_transition(&self, call_id: &str, new_state: CallState) -> Result<()> {
        let calls = self.calls.read().await;

        let call = calls
            .get(call_id)
            .ok_or_else(|| DomainError::NotFound(format!("call {}", call_id)))?;

        check_transition(call_id, call, new_state)
    }

    /// Record the user, cache `entries` and optionally move to `next_state`,
    /// all under one write lock. A rejected transition leaves the call as it
    /// was.
    pub async fn attach_user(
        &self,
        call_id: &str,
        user_id: &str,
        entries: Vec<(&str, MetadataValue)>,
        next_state: Option<CallState>,
    ) -> Result<()> {
        let mut calls = self.calls.write().await;

        let call = calls
            .get_mut(call_id)
            .ok_or_else(|| DomainError::NotFound(format!("call {}", call_id)))?;

        if let Some(next_state) = next_state {
            check_transition(call_id, call, next_state)?;
        }

        call.user_id = user_id.to_string();
        for (key, value) in entries {
            call.metadata.insert(key.to_string(), value);
        }
        match next_state {
            Some(next_state) => apply_transition(call_id, call, next_state),
            None => call.touch(),
        }

        debug!("User {} attached to call {}", user_id, call_id);
        Ok(())
    }

    /// Upsert `metadata[key]`. The value shape is the caller's business.
    pub async fn update_metadata(
        &self,
        call_id: &str,
        key: &str,
        value: impl Into<MetadataValue>,
    ) -> Result<()> {
        let mut calls = self.calls.write().await;

        let call = calls
            .get_mut(call_id)
            .ok_or_else(|| DomainError::NotFound(format!("call {}", call_id)))?;

        call.metadata.insert(key.to_string(), value.into());
        call.touch();

        debug!("Call metadata updated: {} [{}]", call_id, key);
        Ok(())
    }

    pub async fn delete_call(&self, call_id: &str) -> Result<()> {
        let mut calls = self.calls.write().await;

        if calls.remove(call_id).is_none() {
            return Err(DomainError::NotFound(format!("call {}", call_id)));
        }

        info!("Call deleted: {}", call_id);
        Ok(())
    }

    pub async fn get_all_calls(&self) -> Vec<CallContext> {
        let calls = self.calls.read().await;
        calls.values().cloned().collect()
    }

    pub async fn count_calls(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Drop calls stuck in `PROCESSING_REQUEST` for longer than `max_age`.
    ///
    /// Returns the ids of removed calls.
    pub async fn sweep_stale(&self, max_age: Duration) -> Vec<String> {
        let max_age = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
        let cutoff = Utc::now().timestamp().saturating_sub(max_age);
        let mut calls = self.calls.write().await;

        let stale: Vec<String> = calls
            .values()
            .filter(|call| call.state == CallState::ProcessingRequest && call.updated_at < cutoff)
            .map(|call| call.call_id.clone())
            .collect();

        for call_id in &stale {
            calls.remove(call_id);
            warn!("Swept stalled call: {}", call_id);
        }

        stale
    }
}

fn check_transition(call_id: &str, call: &CallContext, new_state: CallState) -> Result<()> {
    if call.state.can_transition_to(&new_state) {
        return Ok(());
    }

    counter!("call_transition_failures_total").increment(1);
    warn!(
        "Rejected transition for call {}: {} -> {}",
        call_id, call.state, new_state
    );
    Err(DomainError::InvalidStateTransition(format!(
        "{} -> {}",
        call.state, new_state
    )))
}

fn apply_transition(call_id: &str, call: &mut CallContext, new_state: CallState) {
    let old_state = call.state;
    call.state = new_state;
    call.touch();

    counter!("call_transitions_total", "to" => new_state.as_str()).increment(1);
    info!("Call state updated: {} [{} -> {}]", call_id, old_state, new_state);
}
