//! Domain layer - Core business logic and rules
//!
//! This layer contains:
//! - The call lifecycle: states, transition table and the call registry
//! - Users, sessions, accounts and the repository port
//! - The banking backend port and the snapshots it returns
//! - PIN authentication

pub mod auth;
pub mod banking;
pub mod call;
pub mod shared;
pub mod user;

// Re-export commonly used types
pub use shared::{DomainError, Result};
