//! Interface layer - External interfaces
//!
//! This layer handles:
//! - The provider webhook
//! - Orchestration, admin and auth REST endpoints
//! - Request/response formatting

pub mod api;
