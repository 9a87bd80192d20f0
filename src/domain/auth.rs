//! PIN login and bearer sessions

use crate::domain::shared::error::{DomainError, Result};
use crate::domain::user::{Account, AuthUser, Session, UserRepository};
use chrono::{Datelike, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a successful login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginOutcome {
    pub token: String,
    pub user_id: String,
    pub name: String,
    pub expires_at: i64,
}

/// A freshly registered user together with the accounts seeded for them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub user: AuthUser,
    pub accounts: Vec<Account>,
}

/// Demo customers created when sample seeding is enabled
pub const SAMPLE_USERS: [(&str, &str, &str, &str); 5] = [
    ("+14155552671", "1234", "Alice Johnson", "alice@example.com"),
    ("+14155552672", "5678", "Bob Smith", "bob@example.com"),
    ("+14155552673", "9012", "Carol Williams", "carol@example.com"),
    ("+14155552674", "3456", "David Brown", "david@example.com"),
    ("+14155552675", "7890", "Emma Davis", "emma@example.com"),
];

pub struct AuthService {
    repository: Arc<dyn UserRepository>,
}

impl AuthService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    /// Check a phone/PIN pair and issue a 24h session
    pub async fn login(&self, phone: &str, pin: &str) -> Result<LoginOutcome> {
        let user = self
            .repository
            .find_by_phone(phone)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("user {}", phone)))?;

        // Plain equality, see AuthUser::pin
        if user.pin != pin {
            warn!("Invalid PIN for user: {}", phone);
            return Err(DomainError::Unauthorized("invalid PIN".to_string()));
        }

        let session = Session::new(generate_token(), user.user_id.clone());
        self.repository.create_session(&session).await?;

        info!("User logged in: {} ({})", user.name, phone);

        Ok(LoginOutcome {
            token: session.token,
            user_id: user.user_id,
            name: user.name,
            expires_at: session.expires_at,
        })
    }

    /// Return the session behind `token`; expired sessions are deleted on sight
    pub async fn validate_token(&self, token: &str) -> Result<Session> {
        let session = self
            .repository
            .find_session(token)
            .await?
            .ok_or_else(|| DomainError::Unauthorized("token not found".to_string()))?;

        if session.is_expired() {
            self.repository.delete_session(token).await?;
            return Err(DomainError::Unauthorized("token expired".to_string()));
        }

        Ok(session)
    }

    pub async fn logout(&self, token: &str) -> Result<()> {
        let session = self
            .repository
            .find_session(token)
            .await?
            .ok_or_else(|| DomainError::Unauthorized("token not found".to_string()))?;

        self.repository.delete_session(token).await?;
        info!("User logged out: {}", session.user_id);
        Ok(())
    }

    /// Create a user with a checking and a savings account, and sometimes a
    /// money market account, all with random balances
    pub async fn register_user(
        &self,
        phone: &str,
        pin: &str,
        name: &str,
        email: &str,
    ) -> Result<RegisteredUser> {
        if self.repository.find_by_phone(phone).await?.is_some() {
            return Err(DomainError::AlreadyExists(format!("user {}", phone)));
        }

        let registered = seed_user(phone, pin, name, email);

        self.repository.create_user(&registered.user).await?;
        for account in &registered.accounts {
            self.repository.create_account(account).await?;
        }

        info!(
            "New user registered: {} ({}) with {} accounts",
            name,
            phone,
            registered.accounts.len()
        );
        Ok(registered)
    }

    pub async fn get_user(&self, phone: &str) -> Result<AuthUser> {
        self.repository
            .find_by_phone(phone)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("user {}", phone)))
    }

    pub async fn list_users(&self) -> Result<Vec<AuthUser>> {
        self.repository.list_users().await
    }

    /// Register the demo customers, skipping any that already exist
    pub async fn create_sample_users(&self) -> Result<usize> {
        let mut created = 0;
        for (phone, pin, name, email) in SAMPLE_USERS {
            match self.register_user(phone, pin, name, email).await {
                Ok(_) => created += 1,
                Err(e) => warn!("Could not create sample user {}: {}", name, e),
            }
        }
        info!("Created {} sample users", created);
        Ok(created)
    }
}

fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

fn random_string(len: usize) -> String {
    const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| LETTERS[rng.gen_range(0..LETTERS.len())] as char)
        .collect()
}

fn random_balance(min: u32, max: u32) -> f64 {
    let mut rng = rand::thread_rng();
    let whole = rng.gen_range(min..=max) as f64;
    let cents = rng.gen_range(0..=99) as f64;
    whole + cents / 100.0
}

fn random_address() -> String {
    const STREETS: [&str; 5] = ["Main St", "Oak Ave", "Maple Drive", "Elm Street", "Pine Road"];
    const CITIES: [&str; 5] = ["Springfield", "Riverside", "Brookside", "Willowville", "Sunnydale"];
    const STATES: [&str; 5] = ["CA", "NY", "TX", "FL", "IL"];

    let mut rng = rand::thread_rng();
    format!(
        "{} {}, {}, {} {}",
        rng.gen_range(100..=9999),
        STREETS[rng.gen_range(0..STREETS.len())],
        CITIES[rng.gen_range(0..CITIES.len())],
        STATES[rng.gen_range(0..STATES.len())],
        rng.gen_range(10000..=99999)
    )
}

/// Somebody between 18 and 75
fn random_date_of_birth() -> String {
    let mut rng = rand::thread_rng();
    let year = Utc::now().year() - rng.gen_range(18..=75);
    format!(
        "{:04}-{:02}-{:02}",
        year,
        rng.gen_range(1..=12),
        rng.gen_range(1..=28)
    )
}

fn random_ssn() -> String {
    let mut rng = rand::thread_rng();
    format!(
        "{:03}-{:02}-{:04}",
        rng.gen_range(0..=999),
        rng.gen_range(0..=99),
        rng.gen_range(0..=9999)
    )
}

fn seed_user(phone: &str, pin: &str, name: &str, email: &str) -> RegisteredUser {
    let now = Utc::now().timestamp();
    let user_id = format!("user_{}", random_string(8));

    let mut specs = vec![
        ("checking", "Checking", random_balance(1_000, 10_000)),
        ("savings", "Savings", random_balance(5_000, 50_000)),
    ];
    if rand::thread_rng().gen_bool(0.5) {
        specs.push(("market", "Money Market", random_balance(10_000, 100_000)));
    }

    let accounts: Vec<Account> = specs
        .into_iter()
        .map(|(prefix, account_type, balance)| Account {
            account_id: format!("{}_{}", prefix, random_string(6)),
            user_id: user_id.clone(),
            account_type: account_type.to_string(),
            balance,
            created_at: now,
        })
        .collect();

    let user = AuthUser {
        user_id,
        phone: phone.to_string(),
        pin: pin.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        address: random_address(),
        date_of_birth: random_date_of_birth(),
        ssn: random_ssn(),
        accounts: accounts.iter().map(|a| a.account_id.clone()).collect(),
        created_at: now,
    };

    RegisteredUser { user, accounts }
}
