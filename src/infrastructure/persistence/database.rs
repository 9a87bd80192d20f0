//! PostgreSQL pool backing the user store

use crate::config::Settings;
use reqwest::Url;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

const USER_STORE_TABLES: &str = "users, sessions, accounts, transactions";

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_connections: settings.database_max_connections,
            ..Self::new(settings.database_url.clone())
        }
    }
}

/// Connect and bring the user store schema up to date
pub async fn open_user_store(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    info!(
        "Connecting user store at {} (pool of {})",
        redact_credentials(&config.url),
        config.max_connections
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("User store schema ready ({})", USER_STORE_TABLES);

    Ok(pool)
}

/// Connection URL with any password replaced, for logs
fn redact_credentials(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return "<unparseable database url>".to_string();
    };
    if parsed.password().is_some() && parsed.set_password(Some("****")).is_err() {
        return "<unparseable database url>".to_string();
    }
    parsed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_is_redacted() {
        assert_eq!(
            redact_credentials("postgres://bank:s3cret@db:5432/voicebank"),
            "postgres://bank:****@db:5432/voicebank"
        );
    }

    #[test]
    fn test_user_without_password_is_kept() {
        assert_eq!(
            redact_credentials("postgres://bank@db/voicebank"),
            "postgres://bank@db/voicebank"
        );
        assert_eq!(
            redact_credentials("postgres://localhost/voicebank"),
            "postgres://localhost/voicebank"
        );
    }

    #[test]
    fn test_garbage_url_is_not_echoed() {
        assert_eq!(
            redact_credentials("host=db password=secret"),
            "<unparseable database url>"
        );
    }

    #[test]
    fn test_pool_settings_follow_service_settings() {
        let settings = Settings {
            database_url: "postgres://db/voicebank".into(),
            database_max_connections: 12,
            ..Default::default()
        };
        let config = DatabaseConfig::from_settings(&settings);
        assert_eq!(config.url, "postgres://db/voicebank");
        assert_eq!(config.max_connections, 12);
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
    }
}
