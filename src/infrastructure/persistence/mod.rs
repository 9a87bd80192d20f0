//! Persistence implementations

pub mod memory;
#[cfg(feature = "postgres")]
pub mod database;
#[cfg(feature = "postgres")]
pub mod user_repository;

pub use memory::MemoryUserRepository;
#[cfg(feature = "postgres")]
pub use database::{open_user_store, DatabaseConfig};
#[cfg(feature = "postgres")]
pub use user_repository::PgUserRepository;
