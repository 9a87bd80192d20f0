//! Configuration management
//!
//! Layers, lowest to highest priority: built-in defaults, an optional TOML
//! file (`orchestrator.toml`, or the path in `ORCHESTRATOR_CONFIG`), then
//! environment variables.

use crate::infrastructure::backend::BackendConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "orchestrator.toml";

/// Unprefixed environment variables read as settings
const ENV_KEYS: [&str; 13] = [
    "RETELL_API_KEY",
    "BACKEND_URL",
    "LOG_LEVEL",
    "CALL_STATE_DB",
    "USER_STORE",
    "DATABASE_URL",
    "DATABASE_MAX_CONNECTIONS",
    "BACKEND_MAX_RETRIES",
    "BACKEND_TIMEOUT_SECS",
    "REQUEST_TIMEOUT_SECS",
    "STALE_CALL_TIMEOUT_SECS",
    "STALE_CALL_SWEEP_INTERVAL_SECS",
    "SEED_SAMPLE_USERS",
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// Shared secret for webhook signatures
    #[serde(skip_serializing)]
    pub retell_api_key: String,
    pub backend_url: String,
    pub log_level: String,
    pub call_state_db: String,
    pub user_store: String,
    #[serde(skip_serializing)]
    pub database_url: String,
    pub database_max_connections: u32,
    pub backend_max_retries: u32,
    pub backend_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub stale_call_timeout_secs: Option<u64>,
    pub stale_call_sweep_interval_secs: u64,
    pub seed_sample_users: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
            retell_api_key: String::new(),
            backend_url: "http://localhost:8000".to_string(),
            log_level: "info".to_string(),
            call_state_db: "memory".to_string(),
            user_store: "memory".to_string(),
            database_url: "postgres://localhost/voicebank".to_string(),
            database_max_connections: 5,
            backend_max_retries: 3,
            backend_timeout_secs: 30,
            request_timeout_secs: 150,
            stale_call_timeout_secs: None,
            stale_call_sweep_interval_secs: 60,
            seed_sample_users: false,
        }
    }
}

impl Settings {
    /// Load from the process environment and the optional config file
    pub fn load() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::load_from(vars)
    }

    /// Load using `vars` in place of the process environment
    pub fn load_from(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = Settings::default();
        let file = vars
            .get("ORCHESTRATOR_CONFIG")
            .cloned()
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
        let known: HashMap<String, String> = vars
            .iter()
            .filter(|(key, _)| ENV_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let settings = config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", defaults.port as i64)?
            .set_default("retell_api_key", defaults.retell_api_key)?
            .set_default("backend_url", defaults.backend_url)?
            .set_default("log_level", defaults.log_level)?
            .set_default("call_state_db", defaults.call_state_db)?
            .set_default("user_store", defaults.user_store)?
            .set_default("database_url", defaults.database_url)?
            .set_default(
                "database_max_connections",
                defaults.database_max_connections as i64,
            )?
            .set_default("backend_max_retries", defaults.backend_max_retries as i64)?
            .set_default("backend_timeout_secs", defaults.backend_timeout_secs as i64)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs as i64)?
            .set_default(
                "stale_call_sweep_interval_secs",
                defaults.stale_call_sweep_interval_secs as i64,
            )?
            .set_default("seed_sample_users", defaults.seed_sample_users)?
            .add_source(config::File::with_name(&file).required(false))
            .add_source(
                config::Environment::default()
                    .try_parsing(true)
                    .source(Some(known)),
            )
            // ORCHESTRATOR_HOST / ORCHESTRATOR_PORT
            .add_source(
                config::Environment::with_prefix("ORCHESTRATOR")
                    .try_parsing(true)
                    .source(Some(vars)),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Reject settings the service cannot start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retell_api_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "RETELL_API_KEY environment variable is required".to_string(),
            ));
        }

        if self.call_state_db != "memory" {
            return Err(ConfigError::Invalid(format!(
                "unsupported CALL_STATE_DB '{}': only 'memory' is available",
                self.call_state_db
            )));
        }

        match self.user_store.as_str() {
            "memory" => {}
            "postgres" if cfg!(feature = "postgres") => {}
            "postgres" => {
                return Err(ConfigError::Invalid(
                    "USER_STORE=postgres requires the 'postgres' feature".to_string(),
                ))
            }
            other => {
                return Err(ConfigError::Invalid(format!(
                    "unsupported USER_STORE '{}'",
                    other
                )))
            }
        }

        if self.user_store == "postgres" && self.database_max_connections == 0 {
            return Err(ConfigError::Invalid(
                "DATABASE_MAX_CONNECTIONS must be greater than zero".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 || self.backend_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeouts must be greater than zero".to_string(),
            ));
        }

        if self.stale_call_timeout_secs.is_some() && self.stale_call_sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "STALE_CALL_SWEEP_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn backend(&self) -> BackendConfig {
        BackendConfig {
            base_url: self.backend_url.clone(),
            max_retries: self.backend_max_retries,
            timeout: Duration::from_secs(self.backend_timeout_secs),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// `None` keeps stalled calls forever
    pub fn stale_call_timeout(&self) -> Option<Duration> {
        self.stale_call_timeout_secs.map(Duration::from_secs)
    }

    pub fn stale_call_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.stale_call_sweep_interval_secs)
    }
}
