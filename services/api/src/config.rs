//! services/api/src/config.rs
//!
//! Server configuration, read once from the environment at startup.
//! A `.env` file in the working directory is honoured outside of tests.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Clone, Debug)]
pub struct Config {
    /// `BIND_ADDRESS`, default `0.0.0.0:3000`.
    pub bind_address: SocketAddr,
    /// `DATABASE_URL`, required.
    pub database_url: String,
    /// `RUST_LOG`, default `INFO`.
    pub log_level: Level,
    /// `CATALOG_PATH`, default `./data/catalog.json`.
    pub catalog_path: PathBuf,
    /// `CORS_ORIGIN`, the single browser origin allowed to send credentials.
    pub cors_origin: String,
    /// `SESSION_TTL_DAYS`, default 30. Must be positive.
    pub session_ttl_days: i64,
    /// `ESTIMATE_IDLE_MINUTES`, default 120. Untouched estimates older than this are dropped.
    pub estimate_idle_minutes: u64,
    /// `MAX_ESTIMATES`, default 10000. Creating past this evicts the least recently used.
    pub max_estimates: usize,
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(name: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = var_or(name, default);
    raw.parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("'{}': {}", raw, e)))
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let session_ttl_days: i64 = parse_var("SESSION_TTL_DAYS", "30")?;
        if session_ttl_days <= 0 {
            return Err(ConfigError::InvalidValue(
                "SESSION_TTL_DAYS".to_string(),
                format!("'{}' is not a positive number of days", session_ttl_days),
            ));
        }

        let max_estimates: usize = parse_var("MAX_ESTIMATES", "10000")?;
        if max_estimates == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_ESTIMATES".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            bind_address: parse_var("BIND_ADDRESS", "0.0.0.0:3000")?,
            database_url,
            log_level: parse_var("RUST_LOG", "INFO")?,
            catalog_path: PathBuf::from(var_or("CATALOG_PATH", "./data/catalog.json")),
            cors_origin: var_or("CORS_ORIGIN", "http://localhost:3000"),
            session_ttl_days,
            estimate_idle_minutes: parse_var("ESTIMATE_IDLE_MINUTES", "120")?,
            max_estimates,
        })
    }
}
