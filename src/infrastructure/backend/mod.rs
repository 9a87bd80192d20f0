//! Adapter for the banking business-logic service

pub mod backoff;
pub mod client;

pub use backoff::{Backoff, LinearBackoff};
pub use client::{BackendClient, BackendConfig};
