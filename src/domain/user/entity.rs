//! User, session, account and transaction entities

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Sessions are valid for a fixed window after login
pub const SESSION_TTL_SECS: i64 = 24 * 60 * 60;

/// A customer who can authenticate during a call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: String,
    pub phone: String,
    /// Stored and compared verbatim.
    // TODO: replace with a password-hashing function (argon2/bcrypt) before production use.
    #[serde(skip_serializing)]
    pub pin: String,
    pub name: String,
    pub email: String,
    pub address: String,
    pub date_of_birth: String,
    #[serde(skip_serializing)]
    pub ssn: String,
    /// Owned account ids, in creation order
    pub accounts: Vec<String>,
    pub created_at: i64,
}

/// Bearer session issued on login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub created_at: i64,
    pub expires_at: i64,
}

impl Session {
    pub fn new(token: String, user_id: String) -> Self {
        let now = Utc::now().timestamp();
        Self {
            token,
            user_id,
            created_at: now,
            expires_at: now + SESSION_TTL_SECS,
        }
    }

    /// Valid iff `now < expires_at`
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: String,
    pub user_id: String,
    pub account_type: String,
    pub balance: f64,
    pub created_at: i64,
}

/// Ledger line used for statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub account_id: String,
    pub from_account: Option<String>,
    pub to_account: Option<String>,
    pub amount: f64,
    pub transaction_date: i64,
    pub description: Option<String>,
}

/// Transaction creation data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub account_id: String,
    pub from_account: Option<String>,
    pub to_account: Option<String>,
    pub amount: f64,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_window() {
        let session = Session::new("t".into(), "u".into());
        assert_eq!(session.expires_at - session.created_at, SESSION_TTL_SECS);
        assert!(!session.is_expired());

        let stale = Session {
            expires_at: Utc::now().timestamp() - 1,
            ..session
        };
        assert!(stale.is_expired());
    }

    #[test]
    fn test_secrets_not_serialized() {
        let user = AuthUser {
            user_id: "user_1".into(),
            phone: "+1".into(),
            pin: "1234".into(),
            name: "A".into(),
            email: String::new(),
            address: String::new(),
            date_of_birth: String::new(),
            ssn: "000-00-0000".into(),
            accounts: vec![],
            created_at: 0,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("pin").is_none());
        assert!(json.get("ssn").is_none());
    }
}
