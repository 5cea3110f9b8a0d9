use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

use crate::core::{AppError, Result};

/// Connection pool settings for the ledger database.
///
/// `pool_size` connections are kept warm; the pool may grow up to
/// `max_connections` under load. Both timeouts are env-tunable since
/// acceptable acquire latency differs between the dashboard deployment
/// and a laptop running the migrations.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// Connections older than this are retired on return to the pool, so
/// none outlives MySQL's own wait_timeout.
const MAX_CONNECTION_AGE_SECS: u64 = 1800;

impl DatabaseConfig {
    pub fn from_env() -> Result<Self> {
        Ok(DatabaseConfig {
            url: env::var("DATABASE_URL")
                .map_err(|_| AppError::Configuration("DATABASE_URL not set".to_string()))?,
            pool_size: parse_env("DATABASE_POOL_SIZE", 10)?,
            max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 20)?,
            acquire_timeout_secs: parse_env("DATABASE_ACQUIRE_TIMEOUT_SECS", 30)?,
            idle_timeout_secs: parse_env("DATABASE_IDLE_TIMEOUT_SECS", 600)?,
        })
    }

    /// Open the pool described by this config. Connections are pinged
    /// before reuse so a restarted database shows up as a reconnect.
    pub async fn create_pool(&self) -> Result<MySqlPool> {
        MySqlPoolOptions::new()
            .min_connections(self.pool_size)
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(MAX_CONNECTION_AGE_SECS))
            .test_before_acquire(true)
            .connect(&self.url)
            .await
            .map_err(AppError::Database)
    }
}

fn parse_env<T: FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::Configuration(format!("Invalid {}", name))),
        Err(_) => Ok(default),
    }
}
