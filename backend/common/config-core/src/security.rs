//! JWT verification settings

use crate::ConfigError;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use token_codec::{
    validate_secret_strength, Algorithm, KeyFamily, KeyMaterial, PolicyError, SecretStrength,
    VerificationPolicy,
};
use validator::Validate;

/// How this service verifies tokens
///
/// Exactly one of `secret` and `public_key_pem` must be set. There is no
/// default secret.
#[derive(Debug, Deserialize, Validate)]
pub struct JwtSettings {
    /// Shared HMAC secret (HS* algorithms)
    #[serde(default)]
    pub secret: Option<SecretString>,

    /// Issuer public key, PEM encoded (RS*, PS*, ES* algorithms)
    #[serde(default)]
    pub public_key_pem: Option<String>,

    /// Accepted algorithm names
    #[validate(length(min = 1))]
    #[serde(default = "default_algorithms")]
    pub algorithms: Vec<String>,

    /// Clock-skew tolerance for `exp` and `nbf`
    #[validate(range(max = 300))]
    #[serde(default = "default_leeway")]
    pub leeway_secs: u64,

    /// Required `iss`
    #[serde(default)]
    pub issuer: Option<String>,

    /// Required `aud`
    #[serde(default)]
    pub audience: Option<String>,
}

fn default_algorithms() -> Vec<String> {
    vec!["HS256".to_string()]
}

fn default_leeway() -> u64 {
    30
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            secret: None,
            public_key_pem: None,
            algorithms: default_algorithms(),
            leeway_secs: default_leeway(),
            issuer: None,
            audience: None,
        }
    }
}

impl JwtSettings {
    /// Accepted algorithms, parsed
    pub fn parsed_algorithms(&self) -> Result<Vec<Algorithm>, ConfigError> {
        if self.algorithms.is_empty() {
            return Err(ConfigError::InvalidAlgorithm("no algorithms configured".to_string()));
        }

        self.algorithms
            .iter()
            .map(|name| {
                Algorithm::from_str(name.trim())
                    .map_err(|_| ConfigError::InvalidAlgorithm(format!("unknown algorithm {name:?}")))
            })
            .collect()
    }

    fn key_material(&self, algorithms: &[Algorithm]) -> Result<KeyMaterial, ConfigError> {
        let secret = self
            .secret
            .as_ref()
            .map(|s| s.expose_secret())
            .filter(|s| !s.is_empty());
        let public_key = self.public_key_pem.as_deref().filter(|pem| !pem.trim().is_empty());

        match (secret, public_key) {
            (Some(_), Some(_)) => Err(ConfigError::AmbiguousKeyMaterial),
            (None, None) => Err(ConfigError::MissingKeyMaterial),
            (Some(secret), None) => {
                match validate_secret_strength(secret) {
                    SecretStrength::Weak => return Err(ConfigError::WeakSecret),
                    SecretStrength::Acceptable => {
                        tracing::warn!("jwt.secret is acceptable but shorter than recommended (64 bytes)")
                    }
                    SecretStrength::Strong => {}
                }
                Ok(KeyMaterial::secret(secret))
            }
            (None, Some(pem)) => match algorithms.first().map(|alg| KeyFamily::of(*alg)) {
                Some(KeyFamily::Rsa) => Ok(KeyMaterial::RsaPublicPem(pem.to_string())),
                Some(KeyFamily::Ec) => Ok(KeyMaterial::EcPublicPem(pem.to_string())),
                _ => Err(ConfigError::InvalidAlgorithm(
                    "jwt.public_key_pem requires RS*, PS* or ES* algorithms".to_string(),
                )),
            },
        }
    }

    /// Convert into an immutable policy
    pub fn build_policy(&self) -> Result<VerificationPolicy, ConfigError> {
        let algorithms = self.parsed_algorithms()?;
        let key = self.key_material(&algorithms)?;

        let mut policy = VerificationPolicy::new(key, algorithms)
            .and_then(|policy| policy.with_leeway(Duration::from_secs(self.leeway_secs)))
            .map_err(|e| match e {
                PolicyError::EmptyKey => ConfigError::MissingKeyMaterial,
                PolicyError::InvalidKey(reason) => ConfigError::InvalidKey(reason),
                other => ConfigError::InvalidAlgorithm(other.to_string()),
            })?;

        if let Some(issuer) = &self.issuer {
            policy = policy.with_issuer(issuer.clone());
        }
        if let Some(audience) = &self.audience {
            policy = policy.with_audience(audience.clone());
        }

        Ok(policy)
    }
}
