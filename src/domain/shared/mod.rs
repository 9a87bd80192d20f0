//! Shared kernel - Common types used across the call and user contexts

pub mod error;
pub mod result;

pub use error::DomainError;
pub use result::Result;
