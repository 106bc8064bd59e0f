//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

/// Default store location.
pub const DEFAULT_DATABASE_URL: &str = "sqlite:momo_transactions.db?mode=rwc";

/// Dashboard server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `DASHBOARD_ADDR` | Server bind address | `127.0.0.1:5000` |
    /// | `DATABASE_URL` | SQLite database URL | `sqlite:momo_transactions.db?mode=rwc` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(
            env::var("DASHBOARD_ADDR").ok(),
            env::var("DATABASE_URL").ok(),
        )
    }

    fn from_vars(addr: Option<String>, database_url: Option<String>) -> Result<Self, ConfigError> {
        let addr = addr
            .unwrap_or_else(|| "127.0.0.1:5000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = database_url.unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        Ok(Self { addr, database_url })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid DASHBOARD_ADDR format")]
    InvalidAddr,
}
