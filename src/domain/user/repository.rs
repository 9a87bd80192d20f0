//! User repository interface

use super::entity::{Account, AuthUser, NewTransaction, Session, Transaction};
use crate::domain::shared::error::Result;
use async_trait::async_trait;

/// Persistence port for users, sessions, accounts and transactions.
///
/// Implemented in memory and on PostgreSQL; exactly one is constructed at
/// startup.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user. Fails with `AlreadyExists` on a duplicate phone.
    async fn create_user(&self, user: &AuthUser) -> Result<()>;

    /// Find user by phone number
    async fn find_by_phone(&self, phone: &str) -> Result<Option<AuthUser>>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: &str) -> Result<Option<AuthUser>>;

    /// List all users, newest first
    async fn list_users(&self) -> Result<Vec<AuthUser>>;

    async fn create_session(&self, session: &Session) -> Result<()>;

    async fn find_session(&self, token: &str) -> Result<Option<Session>>;

    async fn delete_session(&self, token: &str) -> Result<()>;

    /// Remove every expired session, returning how many went
    async fn delete_expired_sessions(&self) -> Result<u64>;

    async fn create_account(&self, account: &Account) -> Result<()>;

    /// Account ids owned by a user, in creation order
    async fn list_account_ids(&self, user_id: &str) -> Result<Vec<String>>;

    async fn find_account(&self, account_id: &str) -> Result<Option<Account>>;

    async fn update_balance(&self, account_id: &str, balance: f64) -> Result<()>;

    async fn record_transaction(&self, tx: &NewTransaction) -> Result<Transaction>;

    /// Latest transactions for an account, newest first
    async fn list_transactions(&self, account_id: &str, limit: i64) -> Result<Vec<Transaction>>;
}
