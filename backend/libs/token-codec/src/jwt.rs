//! Token verification and signing
//!
//! `verify` is the one operation every gatekeeper depends on. Order of checks:
//!
//! 1. structure: three base64url segments, JSON header with an `alg`
//! 2. algorithm: header `alg` must be in the policy allow-list
//! 3. signature: recomputed and compared in constant time by `jsonwebtoken`
//! 4. payload: must deserialize into an [`IdentityClaim`]
//! 5. time: `exp` / `nbf` checked against the clock with the policy leeway
//!
//! An expired token is reported as [`VerifyError::Expired`] only after its
//! signature verified; a forged token with an old `exp` is a signature failure.

use crate::claims::IdentityClaim;
use crate::policy::{KeyFamily, VerificationPolicy};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, EncodingKey, Header, Validation};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Why a token was refused
///
/// Carries no token contents, so it is safe to log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("malformed token: {0}")]
    MalformedToken(&'static str),

    #[error("unsupported signing algorithm")]
    UnsupportedAlgorithm,

    #[error("signature verification failed")]
    SignatureInvalid,

    #[error("token expired")]
    Expired,

    #[error("token not yet valid")]
    NotYetValid,
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    #[error("algorithm {algorithm:?} does not match {family:?} signing key")]
    AlgorithmMismatch {
        algorithm: Algorithm,
        family: KeyFamily,
    },

    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Key material able to sign tokens (issuer side)
#[derive(Clone)]
pub enum SigningKey {
    Secret(Vec<u8>),
    RsaPrivatePem(String),
    EcPrivatePem(String),
}

impl SigningKey {
    pub fn secret(secret: impl AsRef<[u8]>) -> Self {
        SigningKey::Secret(secret.as_ref().to_vec())
    }

    fn family(&self) -> KeyFamily {
        match self {
            SigningKey::Secret(_) => KeyFamily::Hmac,
            SigningKey::RsaPrivatePem(_) => KeyFamily::Rsa,
            SigningKey::EcPrivatePem(_) => KeyFamily::Ec,
        }
    }

    fn encoding_key(&self) -> Result<EncodingKey, EncodeError> {
        match self {
            SigningKey::Secret(secret) => Ok(EncodingKey::from_secret(secret)),
            SigningKey::RsaPrivatePem(pem) => EncodingKey::from_rsa_pem(pem.as_bytes())
                .map_err(|e| EncodeError::InvalidKey(format!("RSA private key: {e}"))),
            SigningKey::EcPrivatePem(pem) => EncodingKey::from_ec_pem(pem.as_bytes())
                .map_err(|e| EncodeError::InvalidKey(format!("EC private key: {e}"))),
        }
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey::{:?}([REDACTED])", self.family())
    }
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Sign a claim into a compact token
///
/// Used by the issuer and by tests; gatekeepers never sign.
pub fn encode(claim: &IdentityClaim, key: &SigningKey, algorithm: Algorithm) -> Result<String, EncodeError> {
    let family = key.family();
    if KeyFamily::of(algorithm) != family {
        return Err(EncodeError::AlgorithmMismatch { algorithm, family });
    }

    let token = jsonwebtoken::encode(&Header::new(algorithm), claim, &key.encoding_key()?)?;
    Ok(token)
}

/// Validate and decode a token against the current time
pub fn verify(token: &str, policy: &VerificationPolicy) -> Result<IdentityClaim, VerifyError> {
    verify_at(token, policy, chrono::Utc::now().timestamp())
}

/// Validate and decode a token against an explicit clock (Unix seconds)
pub fn verify_at(token: &str, policy: &VerificationPolicy, now: i64) -> Result<IdentityClaim, VerifyError> {
    let algorithm = header_algorithm(token)?;
    if !policy.accepts(algorithm) {
        return Err(VerifyError::UnsupportedAlgorithm);
    }

    let token_data = jsonwebtoken::decode::<IdentityClaim>(token, policy.decoding_key(), &validation(policy))
        .map_err(classify)?;
    let claim = token_data.claims;

    let leeway = i64::try_from(policy.leeway().as_secs()).unwrap_or(i64::MAX);

    if let Some(exp) = claim.exp {
        if now > exp.saturating_add(leeway) {
            return Err(VerifyError::Expired);
        }
    }

    if let Some(nbf) = claim.nbf {
        if now.saturating_add(leeway) < nbf {
            return Err(VerifyError::NotYetValid);
        }
    }

    Ok(claim)
}

/// Read the header `alg` without trusting anything else in the token
fn header_algorithm(token: &str) -> Result<Algorithm, VerifyError> {
    let mut segments = token.split('.');
    let (Some(header), Some(_), Some(_), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return Err(VerifyError::MalformedToken("expected three dot-separated segments"));
    };

    let header = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| VerifyError::MalformedToken("header is not base64url"))?;

    let header: RawHeader = serde_json::from_slice(&header)
        .map_err(|_| VerifyError::MalformedToken("header is not a JSON object with alg"))?;

    // Unknown names ("none", "HS1") are algorithms we do not accept, not parse errors
    header
        .alg
        .parse::<Algorithm>()
        .map_err(|_| VerifyError::UnsupportedAlgorithm)
}

/// Signature, algorithm, `iss` and `aud` checks delegated to `jsonwebtoken`
///
/// Time checks are done by `verify_at` so the clock can be injected.
fn validation(policy: &VerificationPolicy) -> Validation {
    let mut validation = Validation::new(policy.algorithms()[0]);
    validation.algorithms = policy.algorithms().to_vec();
    validation.required_spec_claims = HashSet::new();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.leeway = 0;

    if let Some(issuer) = policy.issuer() {
        validation.set_issuer(&[issuer]);
        validation.required_spec_claims.insert("iss".to_string());
    }

    if let Some(audience) = policy.audience() {
        validation.set_audience(&[audience]);
        validation.validate_aud = true;
        validation.required_spec_claims.insert("aud".to_string());
    }

    validation
}

fn classify(error: jsonwebtoken::errors::Error) -> VerifyError {
    match error.kind() {
        ErrorKind::InvalidToken => VerifyError::MalformedToken("invalid token structure"),
        ErrorKind::Base64(_) | ErrorKind::Utf8(_) => {
            VerifyError::MalformedToken("segment is not valid base64url")
        }
        ErrorKind::Json(_) => VerifyError::MalformedToken("header or payload JSON is invalid"),
        ErrorKind::MissingRequiredClaim(_) => VerifyError::MalformedToken("missing required claim"),
        ErrorKind::InvalidAlgorithm | ErrorKind::MissingAlgorithm | ErrorKind::InvalidAlgorithmName => {
            VerifyError::UnsupportedAlgorithm
        }
        ErrorKind::ExpiredSignature => VerifyError::Expired,
        ErrorKind::ImmatureSignature => VerifyError::NotYetValid,
        // Wrong issuer or audience: signed, but not for us
        ErrorKind::InvalidSignature | ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => {
            VerifyError::SignatureInvalid
        }
        _ => VerifyError::SignatureInvalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::KeyMaterial;
    use serde_json::json;
    use std::time::Duration;

    const SECRET: &str = "q8Vn2LrT5xWz9KcB4mJd7HsF1gYp6NaE";
    const NOW: i64 = 1_700_000_000;

    fn hs256_policy() -> VerificationPolicy {
        VerificationPolicy::new(KeyMaterial::secret(SECRET), vec![Algorithm::HS256]).unwrap()
    }

    fn sign(claim: &IdentityClaim) -> String {
        encode(claim, &SigningKey::secret(SECRET), Algorithm::HS256).unwrap()
    }

    fn sign_raw(payload: serde_json::Value, algorithm: Algorithm) -> String {
        jsonwebtoken::encode(
            &Header::new(algorithm),
            &payload,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_round_trip_preserves_claim() {
        let claim = IdentityClaim::new("user-1", NOW)
            .with_role("customer")
            .with_expiry(NOW + 3600)
            .with_extra("email", "user@example.com");

        let verified = verify_at(&sign(&claim), &hs256_policy(), NOW).unwrap();
        assert_eq!(verified, claim);
    }

    #[test]
    fn test_numeric_subject_round_trip() {
        let claim = IdentityClaim::new(1234, NOW).with_role("admin");
        let verified = verify_at(&sign(&claim), &hs256_policy(), NOW).unwrap();
        assert_eq!(verified.sub, crate::Subject::Numeric(1234));
    }

    #[test]
    fn test_token_without_expiry_is_accepted() {
        let claim = IdentityClaim::new("user-1", NOW);
        assert!(verify_at(&sign(&claim), &hs256_policy(), NOW + 86_400 * 365).is_ok());
    }

    #[test]
    fn test_wrong_secret() {
        let claim = IdentityClaim::new("user-1", NOW);
        let token = encode(&claim, &SigningKey::secret("some-other-secret-entirely"), Algorithm::HS256).unwrap();

        assert_eq!(verify_at(&token, &hs256_policy(), NOW), Err(VerifyError::SignatureInvalid));
    }

    #[test]
    fn test_expired_beyond_leeway() {
        let claim = IdentityClaim::new("user-1", NOW - 7200).with_expiry(NOW - 3600);
        assert_eq!(verify_at(&sign(&claim), &hs256_policy(), NOW), Err(VerifyError::Expired));
    }

    #[test]
    fn test_expired_within_leeway_is_accepted() {
        let policy = hs256_policy();
        let claim = IdentityClaim::new("user-1", NOW - 600).with_expiry(NOW - 10);
        assert!(verify_at(&sign(&claim), &policy, NOW).is_ok());

        // Boundary: exactly exp + leeway is still valid, one second later is not
        let exp = NOW - policy.leeway().as_secs() as i64;
        let claim = IdentityClaim::new("user-1", NOW - 600).with_expiry(exp);
        let token = sign(&claim);
        assert!(verify_at(&token, &policy, NOW).is_ok());
        assert_eq!(verify_at(&token, &policy, NOW + 1), Err(VerifyError::Expired));
    }

    #[test]
    fn test_zero_leeway() {
        let policy = hs256_policy().with_leeway(Duration::ZERO).unwrap();
        let claim = IdentityClaim::new("user-1", NOW - 600).with_expiry(NOW - 1);
        assert_eq!(verify_at(&sign(&claim), &policy, NOW), Err(VerifyError::Expired));
    }

    #[test]
    fn test_forged_expired_token_is_signature_failure() {
        let claim = IdentityClaim::new("user-1", NOW - 7200).with_expiry(NOW - 3600);
        let token = encode(&claim, &SigningKey::secret("attacker-controlled-secret"), Algorithm::HS256).unwrap();

        assert_eq!(verify_at(&token, &hs256_policy(), NOW), Err(VerifyError::SignatureInvalid));
    }

    #[test]
    fn test_not_yet_valid() {
        let claim = IdentityClaim::new("user-1", NOW).with_not_before(NOW + 3600);
        assert_eq!(verify_at(&sign(&claim), &hs256_policy(), NOW), Err(VerifyError::NotYetValid));

        let claim = IdentityClaim::new("user-1", NOW).with_not_before(NOW + 5);
        assert!(verify_at(&sign(&claim), &hs256_policy(), NOW).is_ok());
    }

    #[test]
    fn test_algorithm_outside_allow_list() {
        let token = sign_raw(json!({"sub": "user-1", "iat": NOW}), Algorithm::HS512);
        assert_eq!(verify_at(&token, &hs256_policy(), NOW), Err(VerifyError::UnsupportedAlgorithm));
    }

    #[test]
    fn test_alg_none_rejected() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"admin","iat":1700000000}"#);
        let token = format!("{header}.{payload}.");

        assert_eq!(verify_at(&token, &hs256_policy(), NOW), Err(VerifyError::UnsupportedAlgorithm));
    }

    #[test]
    fn test_garbage_is_malformed() {
        for token in ["garbage", "", "a.b", "a.b.c.d", "!!!.###.$$$", "eyJhbGciOiJIUzI1NiJ9..x.y"] {
            let result = verify_at(token, &hs256_policy(), NOW);
            assert!(
                matches!(result, Err(VerifyError::MalformedToken(_))),
                "{token:?} gave {result:?}"
            );
        }
    }

    #[test]
    fn test_header_without_alg_is_malformed() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"typ":"JWT"}"#);
        let token = format!("{header}.e30.c2ln");
        assert!(matches!(
            verify_at(&token, &hs256_policy(), NOW),
            Err(VerifyError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_null_expiry_is_malformed() {
        let token = sign_raw(json!({"sub": "a", "iat": 1, "exp": null}), Algorithm::HS256);
        assert_eq!(
            verify_at(&token, &hs256_policy(), 4_000_000_000),
            Err(VerifyError::MalformedToken("header or payload JSON is invalid"))
        );

        let token = sign_raw(json!({"sub": "a", "iat": 1, "nbf": null}), Algorithm::HS256);
        assert!(matches!(
            verify_at(&token, &hs256_policy(), NOW),
            Err(VerifyError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_bad_header_json_is_malformed() {
        let token = sign_raw(json!({"sub": "a", "iat": NOW}), Algorithm::HS256);

        // Replace the header with one whose `kid` has the wrong type
        let forged_header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT","kid":5}"#);
        let rest = token.split_once('.').unwrap().1;
        let forged = format!("{forged_header}.{rest}");

        assert_eq!(
            verify_at(&forged, &hs256_policy(), NOW),
            Err(VerifyError::MalformedToken("header or payload JSON is invalid"))
        );
    }

    #[test]
    fn test_missing_subject_is_malformed() {
        let token = sign_raw(json!({"role": "admin", "iat": NOW}), Algorithm::HS256);
        assert!(matches!(
            verify_at(&token, &hs256_policy(), NOW),
            Err(VerifyError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_issuer_and_audience() {
        let policy = hs256_policy().with_issuer("auth-service").with_audience("marketplace");

        let good = sign(
            &IdentityClaim::new("user-1", NOW)
                .with_extra("iss", "auth-service")
                .with_extra("aud", "marketplace"),
        );
        let verified = verify_at(&good, &policy, NOW).unwrap();
        assert_eq!(verified.extra["iss"], "auth-service");

        let wrong_issuer = sign(
            &IdentityClaim::new("user-1", NOW)
                .with_extra("iss", "somebody-else")
                .with_extra("aud", "marketplace"),
        );
        assert_eq!(verify_at(&wrong_issuer, &policy, NOW), Err(VerifyError::SignatureInvalid));

        let no_audience = sign(&IdentityClaim::new("user-1", NOW).with_extra("iss", "auth-service"));
        assert!(matches!(
            verify_at(&no_audience, &policy, NOW),
            Err(VerifyError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_encode_rejects_family_mismatch() {
        let claim = IdentityClaim::new("user-1", NOW);
        let result = encode(&claim, &SigningKey::secret(SECRET), Algorithm::RS256);
        assert!(matches!(result, Err(EncodeError::AlgorithmMismatch { .. })));
    }

    #[test]
    fn test_error_display_has_no_token_contents() {
        let token = "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiJzZWNyZXQtdXNlciJ9.bad";
        let error = verify_at(token, &hs256_policy(), NOW).unwrap_err();
        let rendered = error.to_string();
        assert!(!rendered.contains("eyJ"));
        assert!(!rendered.contains("secret-user"));
    }
}
