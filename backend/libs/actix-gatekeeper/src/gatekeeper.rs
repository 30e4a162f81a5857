//! Transport-agnostic admission decision
//!
//! `Pending -> Admitted | Rejected`, decided once per request with no retries.
//! The verifier is only consulted when a well-formed bearer token is present.

use crate::rejection::Rejection;
use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use token_codec::{IdentityClaim, TokenVerifier};

const BEARER_PREFIX: &str = "Bearer ";

/// Admission-control checkpoint bound to one verifier
#[derive(Debug)]
pub struct Gatekeeper<V> {
    verifier: V,
}

impl<V: TokenVerifier> Gatekeeper<V> {
    pub fn new(verifier: V) -> Self {
        Self { verifier }
    }

    pub fn verifier(&self) -> &V {
        &self.verifier
    }

    /// Decide whether a request carrying `headers` is admitted
    pub fn admit(&self, headers: &HeaderMap) -> Result<IdentityClaim, Rejection> {
        let token = bearer_token(headers)?;
        Ok(self.verifier.verify(token)?)
    }
}

/// Extract the raw token from `Authorization: Bearer <token>`
///
/// The scheme is matched case-sensitively with exactly one space.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, Rejection> {
    let mut values = headers.get_all(AUTHORIZATION);

    let value = values.next().ok_or(Rejection::NoToken)?;
    if values.next().is_some() {
        return Err(Rejection::MalformedHeader("multiple Authorization headers"));
    }

    let value = value
        .to_str()
        .map_err(|_| Rejection::MalformedHeader("Authorization header is not visible ASCII"))?;

    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(Rejection::MalformedHeader("expected Bearer scheme"))?;

    if token.is_empty() || token.contains(|c: char| c.is_ascii_whitespace()) {
        return Err(Rejection::MalformedHeader("bearer token is empty or contains whitespace"));
    }

    Ok(token)
}
