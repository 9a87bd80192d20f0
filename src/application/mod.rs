//! Application layer - use cases that span the call registry and the
//! banking backend

pub mod error;
pub mod maintenance;
pub mod signature;
pub mod webhook;

pub use error::{OrchestrationError, WebhookRejection};
pub use maintenance::{spawn_active_calls_gauge, spawn_stale_call_sweeper};
pub use signature::{SignatureVerifier, SIGNATURE_HEADER};
pub use webhook::{WebhookEvent, WebhookService};
