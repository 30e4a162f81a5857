//! Credential codec shared by every gatekeeper-protected service
//!
//! Turns a compact JWS token into a verified [`IdentityClaim`], or a definite
//! [`VerifyError`]. Pure: no I/O, no logging, no global state. Every service
//! that trusts a common issuer builds the same [`VerificationPolicy`] and calls
//! the same [`verify`], so admission decisions agree without shared memory.
//!
//! ## Security Design
//!
//! - **Explicit allow-list**: the header algorithm must be one the policy accepts
//! - **No algorithm confusion**: every accepted algorithm must match the key family
//! - **Constant-time comparison**: signatures are checked by `jsonwebtoken`
//! - **No hardcoded keys**: policies are only built from provided key material
//!
//! ## Usage
//!
//! ```rust
//! use token_codec::{encode, verify, IdentityClaim, KeyMaterial, SigningKey, VerificationPolicy};
//! use jsonwebtoken::Algorithm;
//!
//! let secret = "q8Vn2LrT5xWz9KcB4mJd7HsF1gYp6NaE";
//! let policy = VerificationPolicy::new(KeyMaterial::secret(secret), vec![Algorithm::HS256]).unwrap();
//!
//! let claim = IdentityClaim::new("user-42", 1_700_000_000).with_role("vendor");
//! let token = encode(&claim, &SigningKey::secret(secret), Algorithm::HS256).unwrap();
//!
//! let verified = verify(&token, &policy).unwrap();
//! assert_eq!(verified, claim);
//! ```

use std::sync::Arc;

pub mod claims;
pub mod jwt;
pub mod policy;
pub mod secret_validation;

pub use claims::{IdentityClaim, Subject};
pub use jsonwebtoken::Algorithm;
pub use jwt::{encode, verify, verify_at, EncodeError, SigningKey, VerifyError};
pub use policy::{KeyFamily, KeyMaterial, PolicyError, VerificationPolicy};
pub use secret_validation::{
    generate_secure_secret, validate_secret_strength, SecretGenerationError, SecretStrength,
};

/// A codec bound to its verification policy
///
/// This is the only thing a gatekeeper knows about token formats.
pub trait TokenVerifier: Send + Sync {
    /// Verify a raw token (no scheme prefix, no whitespace)
    fn verify(&self, token: &str) -> Result<IdentityClaim, VerifyError>;
}

impl TokenVerifier for VerificationPolicy {
    fn verify(&self, token: &str) -> Result<IdentityClaim, VerifyError> {
        jwt::verify(token, self)
    }
}

impl<T: TokenVerifier + ?Sized> TokenVerifier for Arc<T> {
    fn verify(&self, token: &str) -> Result<IdentityClaim, VerifyError> {
        (**self).verify(token)
    }
}
