//! Voicebank - call orchestration for a voice banking assistant
//!
//! Tracks every call placed through the voice provider in a guarded state
//! machine, authenticates the provider's webhooks, and forwards caller
//! intents to the banking backend with retries.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;

// Re-export commonly used types
pub use domain::shared::error::DomainError;
pub use domain::shared::result::Result;
