//! Shared rejection contract for gatekeeper-protected services
//!
//! Every service that trusts tokens from a common issuer must reject the same
//! request in the same way. This crate holds the pieces of that contract that
//! clients can observe:
//!
//! - [`AuthErrorKind`]: machine-readable rejection reasons
//! - [`HttpErrorResponse`]: the JSON body returned with every rejection
//!
//! # Design Principles
//!
//! 1. **One taxonomy**: reason codes are identical across services
//! 2. **No leaks**: client messages never say which check failed
//! 3. **No PII**: error bodies never echo tokens or claims

pub mod auth;
pub mod http;

pub use auth::AuthErrorKind;
pub use http::HttpErrorResponse;
