//! In-memory user repository for tests and local development

use crate::domain::shared::error::{DomainError, Result};
use crate::domain::user::{Account, AuthUser, NewTransaction, Session, Transaction, UserRepository};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    /// user_id -> user
    users: HashMap<String, AuthUser>,
    /// phone -> user_id
    phones: HashMap<String, String>,
    sessions: HashMap<String, Session>,
    accounts: HashMap<String, Account>,
    transactions: Vec<Transaction>,
    next_transaction_id: i64,
}

/// Process-lifetime store; everything is lost on restart
#[derive(Clone, Default)]
pub struct MemoryUserRepository {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create_user(&self, user: &AuthUser) -> Result<()> {
        let mut tables = self.tables.write().await;

        if tables.phones.contains_key(&user.phone) {
            return Err(DomainError::AlreadyExists(format!("user {}", user.phone)));
        }
        if tables.users.contains_key(&user.user_id) {
            return Err(DomainError::AlreadyExists(format!("user {}", user.user_id)));
        }

        tables.phones.insert(user.phone.clone(), user.user_id.clone());
        tables.users.insert(user.user_id.clone(), user.clone());
        Ok(())
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<AuthUser>> {
        let tables = self.tables.read().await;
        Ok(tables
            .phones
            .get(phone)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn find_by_id(&self, user_id: &str) -> Result<Option<AuthUser>> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(user_id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<AuthUser>> {
        let tables = self.tables.read().await;
        let mut users: Vec<AuthUser> = tables.users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn create_session(&self, session: &Session) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.sessions.contains_key(&session.token) {
            return Err(DomainError::AlreadyExists("session token".to_string()));
        }
        tables.sessions.insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn find_session(&self, token: &str) -> Result<Option<Session>> {
        Ok(self.tables.read().await.sessions.get(token).cloned())
    }

    async fn delete_session(&self, token: &str) -> Result<()> {
        self.tables.write().await.sessions.remove(token);
        Ok(())
    }

    async fn delete_expired_sessions(&self) -> Result<u64> {
        let now = Utc::now().timestamp();
        let mut tables = self.tables.write().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| s.expires_at > now);
        Ok((before - tables.sessions.len()) as u64)
    }

    async fn create_account(&self, account: &Account) -> Result<()> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&account.user_id) {
            return Err(DomainError::NotFound(format!("user {}", account.user_id)));
        }
        if tables.accounts.contains_key(&account.account_id) {
            return Err(DomainError::AlreadyExists(format!(
                "account {}",
                account.account_id
            )));
        }

        tables
            .accounts
            .insert(account.account_id.clone(), account.clone());
        if let Some(user) = tables.users.get_mut(&account.user_id) {
            if !user.accounts.contains(&account.account_id) {
                user.accounts.push(account.account_id.clone());
            }
        }
        Ok(())
    }

    async fn list_account_ids(&self, user_id: &str) -> Result<Vec<String>> {
        let tables = self.tables.read().await;
        // Each user's list is appended to on account creation
        Ok(tables
            .users
            .get(user_id)
            .map(|u| u.accounts.clone())
            .unwrap_or_default())
    }

    async fn find_account(&self, account_id: &str) -> Result<Option<Account>> {
        Ok(self.tables.read().await.accounts.get(account_id).cloned())
    }

    async fn update_balance(&self, account_id: &str, balance: f64) -> Result<()> {
        let mut tables = self.tables.write().await;
        let account = tables
            .accounts
            .get_mut(account_id)
            .ok_or_else(|| DomainError::NotFound(format!("account {}", account_id)))?;
        account.balance = balance;
        Ok(())
    }

    async fn record_transaction(&self, tx: &NewTransaction) -> Result<Transaction> {
        let mut tables = self.tables.write().await;

        if !tables.accounts.contains_key(&tx.account_id) {
            return Err(DomainError::NotFound(format!("account {}", tx.account_id)));
        }

        tables.next_transaction_id += 1;
        let recorded = Transaction {
            id: tables.next_transaction_id,
            account_id: tx.account_id.clone(),
            from_account: tx.from_account.clone(),
            to_account: tx.to_account.clone(),
            amount: tx.amount,
            transaction_date: Utc::now().timestamp(),
            description: tx.description.clone(),
        };
        tables.transactions.push(recorded.clone());
        Ok(recorded)
    }

    async fn list_transactions(&self, account_id: &str, limit: i64) -> Result<Vec<Transaction>> {
        let tables = self.tables.read().await;
        // Ids increase monotonically, so reverse insertion order is newest first
        Ok(tables
            .transactions
            .iter()
            .rev()
            .filter(|t| t.account_id == account_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(user_id: &str, phone: &str) -> AuthUser {
        AuthUser {
            user_id: user_id.into(),
            phone: phone.into(),
            pin: "1234".into(),
            name: "Test".into(),
            email: "t@example.com".into(),
            address: String::new(),
            date_of_birth: "1990-01-01".into(),
            ssn: String::new(),
            accounts: vec![],
            created_at: 0,
        }
    }

    fn account(account_id: &str, user_id: &str, created_at: i64) -> Account {
        Account {
            account_id: account_id.into(),
            user_id: user_id.into(),
            account_type: "Checking".into(),
            balance: 100.0,
            created_at,
        }
    }

    #[tokio::test]
    async fn test_user_lookup_by_phone_and_id() {
        let repo = MemoryUserRepository::new();
        repo.create_user(&user("u1", "+1")).await.unwrap();

        assert_eq!(repo.find_by_phone("+1").await.unwrap().unwrap().user_id, "u1");
        assert_eq!(repo.find_by_id("u1").await.unwrap().unwrap().phone, "+1");
        assert!(repo.find_by_phone("+2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_phone_is_unique() {
        let repo = MemoryUserRepository::new();
        repo.create_user(&user("u1", "+1")).await.unwrap();
        assert!(matches!(
            repo.create_user(&user("u2", "+1")).await,
            Err(DomainError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_accounts_in_creation_order() {
        let repo = MemoryUserRepository::new();
        repo.create_user(&user("u1", "+1")).await.unwrap();
        repo.create_account(&account("b", "u1", 1)).await.unwrap();
        repo.create_account(&account("a", "u1", 2)).await.unwrap();

        assert_eq!(repo.list_account_ids("u1").await.unwrap(), vec!["b", "a"]);
        let found = repo.find_by_id("u1").await.unwrap().unwrap();
        assert_eq!(found.accounts, vec!["b", "a"]);

        assert!(matches!(
            repo.create_account(&account("c", "ghost", 3)).await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_balance_update() {
        let repo = MemoryUserRepository::new();
        repo.create_user(&user("u1", "+1")).await.unwrap();
        repo.create_account(&account("a", "u1", 1)).await.unwrap();

        repo.update_balance("a", 42.5).await.unwrap();
        assert_eq!(repo.find_account("a").await.unwrap().unwrap().balance, 42.5);
        assert!(repo.update_balance("zzz", 1.0).await.is_err());
    }

    #[tokio::test]
    async fn test_transactions_newest_first_with_limit() {
        let repo = MemoryUserRepository::new();
        repo.create_user(&user("u1", "+1")).await.unwrap();
        repo.create_account(&account("a", "u1", 1)).await.unwrap();
        repo.create_account(&account("b", "u1", 2)).await.unwrap();

        for amount in [1.0, 2.0, 3.0] {
            repo.record_transaction(&NewTransaction {
                account_id: "a".into(),
                from_account: Some("a".into()),
                to_account: Some("b".into()),
                amount,
                description: None,
            })
            .await
            .unwrap();
        }

        let latest = repo.list_transactions("a", 2).await.unwrap();
        let amounts: Vec<f64> = latest.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![3.0, 2.0]);
        assert!(repo.list_transactions("b", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expired_sessions_purged() {
        let repo = MemoryUserRepository::new();
        let live = Session::new("live".into(), "u1".into());
        let mut dead = Session::new("dead".into(), "u1".into());
        dead.expires_at = Utc::now().timestamp() - 10;
        repo.create_session(&live).await.unwrap();
        repo.create_session(&dead).await.unwrap();

        assert_eq!(repo.delete_expired_sessions().await.unwrap(), 1);
        assert!(repo.find_session("live").await.unwrap().is_some());
        assert!(repo.find_session("dead").await.unwrap().is_none());
    }
}
