//! Verification policy provisioning for gatekeeper-protected services
//!
//! This library provides:
//! - Layered settings loading (optional TOML file, then `GATEKEEPER__*` env vars)
//! - Secret handling through `secrecy`
//! - Fail-fast conversion of settings into a [`VerificationPolicy`]
//!
//! Every service that trusts the same issuer must be given the same settings.
//! The loader logs a policy fingerprint so operators can confirm they were.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use token_codec::VerificationPolicy;
use validator::Validate;

pub mod security;

pub use security::JwtSettings;

/// Environment variable prefix, e.g. `GATEKEEPER__JWT__SECRET`
pub const ENV_PREFIX: &str = "GATEKEEPER";

/// Separator between the prefix and nested keys
pub const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("no key material configured: set jwt.secret or jwt.public_key_pem")]
    MissingKeyMaterial,

    #[error("jwt.secret and jwt.public_key_pem are both set; configure exactly one")]
    AmbiguousKeyMaterial,

    #[error("jwt.secret is too weak: use at least 32 random bytes")]
    WeakSecret,

    #[error("invalid algorithm configuration: {0}")]
    InvalidAlgorithm(String),

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Root settings of a gatekeeper-protected service
#[derive(Debug, Deserialize, Validate)]
pub struct GatekeeperSettings {
    #[validate(nested)]
    #[serde(default)]
    pub jwt: JwtSettings,
}

impl GatekeeperSettings {
    /// Load settings from an optional file and the process environment
    ///
    /// A file given explicitly must exist.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_from(config_path, None)
    }

    /// Load settings with an explicit environment instead of the process one
    pub fn load_from(
        config_path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .list_separator(",")
                .with_list_parse_key("jwt.algorithms")
                .try_parsing(true)
                .source(env),
        );

        let settings: GatekeeperSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    /// Build the verification policy, refusing anything unsafe
    pub fn build_policy(&self) -> Result<VerificationPolicy, ConfigError> {
        let policy = self.jwt.build_policy()?;

        tracing::info!(
            fingerprint = %policy.fingerprint(),
            "Verification policy loaded"
        );

        Ok(policy)
    }
}

/// Load settings and build the policy in one step
pub fn load_policy(config_path: Option<&Path>) -> Result<VerificationPolicy, ConfigError> {
    GatekeeperSettings::load(config_path)?.build_policy()
}
