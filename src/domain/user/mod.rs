//! User domain

pub mod entity;
pub mod repository;

pub use entity::{Account, AuthUser, NewTransaction, Session, Transaction, SESSION_TTL_SECS};
pub use repository::UserRepository;
