use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("DATABASE_URL environment variable not set")]
    MissingUrl,

    #[error("Invalid DATABASE_URL format: {0}")]
    InvalidUrl(String),
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Full connection URL
    pub url: String,
    /// URL without the database path, used to reach the server's maintenance database
    pub server_url: String,
    /// Database name
    pub name: String,
}

impl DatabaseConfig {
    /// Load database configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = env::var("DATABASE_URL").map_err(|_| ConfigError::MissingUrl)?;
        Self::parse(&url)
    }

    /// Split `scheme://[user:pass@]host[:port]/name[?query]` into server URL and name
    pub fn parse(url: &str) -> Result<Self, ConfigError> {
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| ConfigError::InvalidUrl("missing scheme".to_string()))?;

        let without_query = rest.split('?').next().unwrap_or(rest);
        let (server, name) = without_query
            .rsplit_once('/')
            .ok_or_else(|| ConfigError::InvalidUrl("missing database name".to_string()))?;

        if server.is_empty() || name.is_empty() {
            return Err(ConfigError::InvalidUrl(
                "host and database name are required".to_string(),
            ));
        }

        Ok(Self {
            url: url.to_string(),
            server_url: format!("{}://{}", scheme, server),
            name: name.to_string(),
        })
    }
}
