//! HTTP error response handling
//!
//! Provides the JSON body every gatekeeper returns with a rejection

use crate::AuthErrorKind;
use serde::{Deserialize, Serialize};

/// Standard HTTP error response format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpErrorResponse {
    /// Human-readable error message
    pub error: String,

    /// Machine-readable rejection reason
    pub reason: AuthErrorKind,

    /// HTTP status code
    pub status: u16,

    /// Timestamp of the error
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl HttpErrorResponse {
    /// Create new HTTP error response
    pub fn new(reason: AuthErrorKind, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            reason,
            status: reason.status_code(),
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Builds the client-safe body for a rejection reason
impl From<AuthErrorKind> for HttpErrorResponse {
    fn from(reason: AuthErrorKind) -> Self {
        Self::new(reason, reason.client_message())
    }
}
