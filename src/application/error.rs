//! Errors from use cases that span the call registry and the backend

use crate::domain::banking::BackendError;
use crate::domain::shared::DomainError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrchestrationError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Reasons a webhook delivery is refused before any processing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WebhookRejection {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}
