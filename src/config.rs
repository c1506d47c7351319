// ==============================================================================
// config.rs - Service Configuration
// ==============================================================================
// Description: Environment-driven configuration, resolved once at startup
// ==============================================================================

use std::env;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DATABASE: &str = "v2";

/// Configuration problems are fatal: the process refuses to serve rather
/// than start with a broken store connection.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("MONGO_URL is not defined in the environment; see setup_env.sh.example for more information")]
    MissingMongoUrl,

    #[error("invalid PORT value '{0}'")]
    InvalidPort(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mongo_url: String,
    pub mongo_db: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mongo_url = env::var("MONGO_URL").map_err(|_| ConfigError::MissingMongoUrl)?;
        let mongo_db = env::var("MONGO_DB").unwrap_or_else(|_| DEFAULT_DATABASE.to_string());
        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            Err(_) => DEFAULT_PORT,
        };
        Ok(Config {
            mongo_url,
            mongo_db,
            port,
        })
    }
}
