//! Infrastructure layer - Technical implementations
//!
//! This layer contains:
//! - Repository implementations (in-memory and PostgreSQL)
//! - The HTTP client for the banking backend

pub mod backend;
pub mod persistence;
