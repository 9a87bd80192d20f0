//! Failures talking to the backend service

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Connection refused, timeout, body read failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-2xx response
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode backend response: {0}")]
    Decode(String),

    #[error("failed to encode request: {0}")]
    Encode(String),

    #[error("request failed after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        last: Box<BackendError>,
    },
}

impl BackendError {
    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, BackendError::Transport(_) | BackendError::Status { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transport_and_status_are_retryable() {
        assert!(BackendError::Transport("refused".into()).is_retryable());
        assert!(BackendError::Status {
            status: 404,
            body: String::new()
        }
        .is_retryable());

        assert!(!BackendError::Decode("eof".into()).is_retryable());
        assert!(!BackendError::Encode("nan".into()).is_retryable());
        assert!(!BackendError::Exhausted {
            attempts: 4,
            last: Box::new(BackendError::Transport("refused".into())),
        }
        .is_retryable());
    }
}
