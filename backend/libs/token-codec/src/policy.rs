//! Verification policy: what a service accepts as a valid token
//!
//! Built once at startup, immutable afterwards, shared by reference across
//! every concurrent verification. Construction is where misconfiguration is
//! caught: empty keys, unparsable PEM, and algorithm lists that mix key
//! families all fail here rather than at request time.

use jsonwebtoken::{Algorithm, DecodingKey};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default clock-skew tolerance
pub const DEFAULT_LEEWAY: Duration = Duration::from_secs(30);

/// Largest accepted clock-skew tolerance
pub const MAX_LEEWAY: Duration = Duration::from_secs(300);

/// Key material a verifier holds
#[derive(Clone)]
pub enum KeyMaterial {
    /// Shared HMAC secret (also able to sign)
    Secret(Vec<u8>),
    /// RSA public key in PEM format (verify only)
    RsaPublicPem(String),
    /// EC public key in PEM format (verify only)
    EcPublicPem(String),
}

impl KeyMaterial {
    pub fn secret(secret: impl AsRef<[u8]>) -> Self {
        KeyMaterial::Secret(secret.as_ref().to_vec())
    }

    pub fn family(&self) -> KeyFamily {
        match self {
            KeyMaterial::Secret(_) => KeyFamily::Hmac,
            KeyMaterial::RsaPublicPem(_) => KeyFamily::Rsa,
            KeyMaterial::EcPublicPem(_) => KeyFamily::Ec,
        }
    }

    fn bytes(&self) -> &[u8] {
        match self {
            KeyMaterial::Secret(secret) => secret,
            KeyMaterial::RsaPublicPem(pem) | KeyMaterial::EcPublicPem(pem) => pem.as_bytes(),
        }
    }

    fn decoding_key(&self) -> Result<DecodingKey, PolicyError> {
        match self {
            KeyMaterial::Secret(secret) => Ok(DecodingKey::from_secret(secret)),
            KeyMaterial::RsaPublicPem(pem) => DecodingKey::from_rsa_pem(pem.as_bytes())
                .map_err(|e| PolicyError::InvalidKey(format!("RSA public key: {e}"))),
            KeyMaterial::EcPublicPem(pem) => DecodingKey::from_ec_pem(pem.as_bytes())
                .map_err(|e| PolicyError::InvalidKey(format!("EC public key: {e}"))),
        }
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyMaterial::{:?}([REDACTED])", self.family())
    }
}

/// Key family an algorithm belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    Hmac,
    Rsa,
    Ec,
    Ed,
}

impl KeyFamily {
    pub fn of(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => KeyFamily::Hmac,
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => KeyFamily::Rsa,
            Algorithm::ES256 | Algorithm::ES384 => KeyFamily::Ec,
            Algorithm::EdDSA => KeyFamily::Ed,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("key material is empty")]
    EmptyKey,

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("no accepted algorithms configured")]
    NoAlgorithms,

    #[error("algorithm {algorithm:?} does not match {family:?} key material")]
    AlgorithmMismatch {
        algorithm: Algorithm,
        family: KeyFamily,
    },

    #[error("leeway {0:?} exceeds the 300s maximum")]
    LeewayTooLarge(Duration),
}

/// What counts as a valid token for this service
#[derive(Clone)]
pub struct VerificationPolicy {
    decoding_key: DecodingKey,
    family: KeyFamily,
    algorithms: Vec<Algorithm>,
    leeway: Duration,
    issuer: Option<String>,
    audience: Option<String>,
    key_digest: String,
}

impl VerificationPolicy {
    /// Create a policy with the default leeway
    ///
    /// ## Errors
    ///
    /// - key material is empty or not a valid PEM of its kind
    /// - `algorithms` is empty
    /// - any algorithm belongs to a different key family than `key`
    pub fn new(key: KeyMaterial, algorithms: Vec<Algorithm>) -> Result<Self, PolicyError> {
        if key.bytes().is_empty() {
            return Err(PolicyError::EmptyKey);
        }

        if algorithms.is_empty() {
            return Err(PolicyError::NoAlgorithms);
        }

        let family = key.family();
        if let Some(&algorithm) = algorithms.iter().find(|alg| KeyFamily::of(**alg) != family) {
            return Err(PolicyError::AlgorithmMismatch { algorithm, family });
        }

        let mut algorithms = algorithms;
        algorithms.sort_by_key(|alg| format!("{alg:?}"));
        algorithms.dedup();

        let key_digest = hex::encode(Sha256::digest(key.bytes()));

        Ok(Self {
            decoding_key: key.decoding_key()?,
            family,
            algorithms,
            leeway: DEFAULT_LEEWAY,
            issuer: None,
            audience: None,
            key_digest,
        })
    }

    /// Set the clock-skew tolerance applied to `exp` and `nbf`
    pub fn with_leeway(mut self, leeway: Duration) -> Result<Self, PolicyError> {
        if leeway > MAX_LEEWAY {
            return Err(PolicyError::LeewayTooLarge(leeway));
        }
        self.leeway = leeway;
        Ok(self)
    }

    /// Require tokens to carry this `iss`
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Require tokens to carry this `aud`
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn algorithms(&self) -> &[Algorithm] {
        &self.algorithms
    }

    pub fn accepts(&self, algorithm: Algorithm) -> bool {
        self.algorithms.contains(&algorithm)
    }

    pub fn key_family(&self) -> KeyFamily {
        self.family
    }

    pub fn leeway(&self) -> Duration {
        self.leeway
    }

    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    pub fn audience(&self) -> Option<&str> {
        self.audience.as_deref()
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    /// Non-secret digest of the whole policy
    ///
    /// Two services that would accept exactly the same tokens report the same
    /// fingerprint. Only a truncated hash of the key material is included.
    pub fn fingerprint(&self) -> String {
        let algorithms: Vec<String> = self.algorithms.iter().map(|alg| format!("{alg:?}")).collect();
        format!(
            "alg={};leeway={}s;iss={};aud={};key=sha256:{}",
            algorithms.join(","),
            self.leeway.as_secs(),
            self.issuer.as_deref().unwrap_or("-"),
            self.audience.as_deref().unwrap_or("-"),
            &self.key_digest[..16],
        )
    }
}

impl fmt::Debug for VerificationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationPolicy")
            .field("family", &self.family)
            .field("algorithms", &self.algorithms)
            .field("leeway", &self.leeway)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}
