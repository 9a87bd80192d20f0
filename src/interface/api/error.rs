//! JSON error responses

use crate::application::OrchestrationError;
use crate::domain::banking::BackendError;
use crate::domain::shared::DomainError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::error;

/// `{"error": ..., "status": ..., "details": {...}}`
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<BTreeMap<String, String>>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// 400 with a per-field reason map
    pub fn invalid_fields(details: BTreeMap<String, String>) -> Self {
        Self {
            details: Some(details),
            ..Self::bad_request("Missing or invalid parameters")
        }
    }

    /// Downstream failure for the operation described by `action`
    pub fn backend(action: &str, err: BackendError) -> Self {
        error!("Error trying to {}: {}", action, err);
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to {}: {}", action, err),
        )
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let status = match &err {
            DomainError::ValidationError(_) => StatusCode::BAD_REQUEST,
            DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::InvalidStateTransition(_) | DomainError::AlreadyExists(_) => {
                StatusCode::CONFLICT
            }
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<OrchestrationError> for ApiError {
    fn from(err: OrchestrationError) -> Self {
        match err {
            OrchestrationError::Domain(e) => e.into(),
            OrchestrationError::Backend(e) => Self::backend("load user context", e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": self.message,
            "status": self.status.as_u16(),
        });
        if let Some(details) = self.details {
            body["details"] = json!(details);
        }
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_status_mapping() {
        let cases = [
            (DomainError::ValidationError("x".into()), StatusCode::BAD_REQUEST),
            (DomainError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (DomainError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                DomainError::InvalidStateTransition("x".into()),
                StatusCode::CONFLICT,
            ),
            (DomainError::AlreadyExists("x".into()), StatusCode::CONFLICT),
            (
                DomainError::Internal("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_backend_errors_are_internal() {
        let err = ApiError::backend(
            "get account balance",
            BackendError::Exhausted {
                attempts: 4,
                last: Box::new(BackendError::Status {
                    status: 404,
                    body: "not found".into(),
                }),
            },
        );
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message.starts_with("Failed to get account balance"));
    }

    #[tokio::test]
    async fn test_body_shape() {
        let mut details = BTreeMap::new();
        details.insert("amount".to_string(), "must be greater than 0".to_string());
        let response = ApiError::invalid_fields(details).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], 400);
        assert_eq!(body["error"], "Missing or invalid parameters");
        assert_eq!(body["details"]["amount"], "must be greater than 0");
    }
}
