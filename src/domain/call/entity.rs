//! Call context entity

use super::value_object::CallState;
use crate::domain::banking::{BankUser, UserAccounts};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// User id recorded for calls whose caller has not authenticated yet
pub const UNKNOWN_USER: &str = "unknown";

/// Phone number recorded when the provider does not send one
pub const UNKNOWN_PHONE: &str = "unknown";

/// Well-known metadata keys
pub mod keys {
    pub const PROVIDER_DATA: &str = "retell_data";
    pub const END_DATA: &str = "end_data";
    pub const ANALYZED_DATA: &str = "analyzed_data";
    pub const USER: &str = "user";
    pub const ACCOUNTS: &str = "accounts";
    pub const APPLICATION_ID: &str = "application_id";
}

/// A value in a call's metadata bag.
///
/// The shapes the service writes itself are typed; `Json` keeps the bag open
/// for anything else. Serialized untagged so inspection output shows the raw
/// value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    WebhookPayload(Map<String, Value>),
    User(BankUser),
    Accounts(UserAccounts),
    ApplicationId(String),
    Json(Value),
}

impl From<BankUser> for MetadataValue {
    fn from(user: BankUser) -> Self {
        MetadataValue::User(user)
    }
}

impl From<UserAccounts> for MetadataValue {
    fn from(accounts: UserAccounts) -> Self {
        MetadataValue::Accounts(accounts)
    }
}

impl From<Map<String, Value>> for MetadataValue {
    fn from(payload: Map<String, Value>) -> Self {
        MetadataValue::WebhookPayload(payload)
    }
}

impl From<Value> for MetadataValue {
    fn from(value: Value) -> Self {
        MetadataValue::Json(value)
    }
}

/// One in-flight (or finished, not yet deleted) call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallContext {
    pub call_id: String,
    pub user_id: String,
    pub phone_number: String,
    pub state: CallState,
    pub metadata: HashMap<String, MetadataValue>,
    /// Seconds since epoch
    pub created_at: i64,
    /// Seconds since epoch
    pub updated_at: i64,
}

impl CallContext {
    pub fn new(call_id: String, user_id: String, phone_number: String) -> Self {
        let now = Utc::now().timestamp();
        Self {
            call_id,
            user_id,
            phone_number,
            state: CallState::AwaitingCall,
            metadata: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now().timestamp();
    }

    pub fn metadata(&self, key: &str) -> Option<&MetadataValue> {
        self.metadata.get(key)
    }
}
