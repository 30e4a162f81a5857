/// Configuration management for Product Service
///
/// Only the HTTP listener is configured here. Token verification settings
/// are loaded by `config_core` from `GATEKEEPER__*` variables.
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application environment (dev, staging, prod)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
    /// Optional TOML file with gatekeeper settings
    pub gatekeeper_config: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let port = match std::env::var("PRODUCT_SERVICE_PORT") {
            Ok(value) => value
                .parse()
                .map_err(|_| format!("PRODUCT_SERVICE_PORT is not a valid port: {value:?}"))?,
            Err(_) => 8084,
        };

        Ok(Config {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("PRODUCT_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            gatekeeper_config: std::env::var("GATEKEEPER_CONFIG").ok().map(PathBuf::from),
        })
    }
}
