/// Configuration management for process-studio
///
/// Environment driven. The database endpoint and the service credential are
/// required; `Config::from_env` fails before anything else is initialised when
/// either is missing.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const DATABASE_URL_VAR: &str = "PROCESS_STUDIO_DATABASE_URL";
pub const SERVICE_KEY_VAR: &str = "PROCESS_STUDIO_SERVICE_KEY";
pub const HOST_VAR: &str = "PROCESS_STUDIO_HOST";
pub const PORT_VAR: &str = "PROCESS_STUDIO_PORT";
pub const MAX_CONNECTIONS_VAR: &str = "PROCESS_STUDIO_MAX_CONNECTIONS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// Database endpoint and credential
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx connection URL, e.g. "sqlite://data/studio.db"
    pub url: String,
    /// Service credential presented to the database service
    #[serde(skip_serializing)]
    pub service_key: String,
    /// Upper bound of the connection pool
    pub max_connections: u32,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url)
            .field("service_key", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let url = required(DATABASE_URL_VAR)?;
        let service_key = required(SERVICE_KEY_VAR)?;

        Ok(Self {
            server: ServerConfig {
                host: lookup(HOST_VAR).unwrap_or_else(|| "0.0.0.0".to_string()),
                port: lookup(PORT_VAR)
                    .and_then(|port| port.parse().ok())
                    .unwrap_or(3004),
            },
            database: DatabaseConfig {
                url,
                service_key,
                max_connections: lookup(MAX_CONNECTIONS_VAR)
                    .and_then(|max| max.parse().ok())
                    .unwrap_or(5),
            },
        })
    }
}
