//! Authentication rejection reasons
//!
//! Provides the reason taxonomy shared by every gatekeeper
//! without exposing which check actually failed to the client.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a request was refused admission
///
/// Serialized with the variant name (`"NoToken"`, `"Expired"`, ...) so the
/// `reason` field of an error body is stable across services and languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthErrorKind {
    /// No `Authorization` header on the request
    NoToken,

    /// Header or token could not be parsed, or required claims are missing
    MalformedToken,

    /// Token header names an algorithm outside the accepted set
    UnsupportedAlgorithm,

    /// Signature does not verify against the configured key
    SignatureInvalid,

    /// Token carried an expiry that has passed (beyond leeway)
    Expired,

    /// Token carried a not-before time still in the future (beyond leeway)
    NotYetValid,
}

impl AuthErrorKind {
    /// All reasons, in declaration order
    pub const ALL: [AuthErrorKind; 6] = [
        Self::NoToken,
        Self::MalformedToken,
        Self::UnsupportedAlgorithm,
        Self::SignatureInvalid,
        Self::Expired,
        Self::NotYetValid,
    ];

    /// Stable machine-readable code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoToken => "NoToken",
            Self::MalformedToken => "MalformedToken",
            Self::UnsupportedAlgorithm => "UnsupportedAlgorithm",
            Self::SignatureInvalid => "SignatureInvalid",
            Self::Expired => "Expired",
            Self::NotYetValid => "NotYetValid",
        }
    }

    /// HTTP status for this reason
    ///
    /// A missing credential is 401; a credential that was presented but
    /// refused is 403.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NoToken => 401,
            _ => 403,
        }
    }

    /// Get safe error message for client
    ///
    /// Format, algorithm and signature failures share one message.
    pub fn client_message(&self) -> &'static str {
        match self {
            Self::NoToken => "Authentication required",
            Self::MalformedToken | Self::UnsupportedAlgorithm | Self::SignatureInvalid => {
                "Invalid token"
            }
            Self::Expired => "Token expired",
            Self::NotYetValid => "Token not yet valid",
        }
    }

    /// Authentication failures are never transient
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Log the rejection with appropriate level (no token contents)
    ///
    /// Missing and expired tokens are normal client lifecycle; the rest point
    /// at tampering or a policy mismatch between issuer and verifier.
    pub fn log(&self, path: &str) {
        match self {
            Self::NoToken | Self::Expired | Self::NotYetValid => {
                tracing::debug!(reason = self.as_str(), path, "Request rejected");
            }
            _ => {
                tracing::warn!(reason = self.as_str(), path, "Request rejected");
            }
        }
    }
}

impl fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
