//! # Actix Gatekeeper
//!
//! Bearer-token admission control for actix-web services
//!
//! ## Modules
//! - `gatekeeper`: transport-agnostic admit/reject decision
//! - `jwt_auth`: middleware running the gatekeeper in front of a scope
//! - `identity`: extractor handing the verified claim to handlers
//! - `rejection`: rejection reasons and their 401/403 responses
//! - `logging`: request logging middleware
//! - `metrics`: Prometheus decision counter

pub mod gatekeeper;
pub mod identity;
pub mod jwt_auth;
pub mod logging;
pub mod metrics;
pub mod rejection;

pub use gatekeeper::{bearer_token, Gatekeeper};
pub use identity::Identity;
pub use jwt_auth::GatekeeperMiddleware;
pub use logging::RequestLogging;
pub use rejection::Rejection;
