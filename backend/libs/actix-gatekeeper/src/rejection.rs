//! Rejection raised by the gatekeeper and its HTTP rendering

use actix_web::http::header::{self, HeaderValue};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use error_types::{AuthErrorKind, HttpErrorResponse};
use thiserror::Error;
use token_codec::VerifyError;

/// Terminal refusal of a request; never downgraded to an admit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("no bearer token presented")]
    NoToken,

    #[error("malformed Authorization header: {0}")]
    MalformedHeader(&'static str),

    #[error(transparent)]
    Verify(#[from] VerifyError),
}

impl Rejection {
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            Rejection::NoToken => AuthErrorKind::NoToken,
            Rejection::MalformedHeader(_) => AuthErrorKind::MalformedToken,
            Rejection::Verify(err) => match err {
                VerifyError::MalformedToken(_) => AuthErrorKind::MalformedToken,
                VerifyError::UnsupportedAlgorithm => AuthErrorKind::UnsupportedAlgorithm,
                VerifyError::SignatureInvalid => AuthErrorKind::SignatureInvalid,
                VerifyError::Expired => AuthErrorKind::Expired,
                VerifyError::NotYetValid => AuthErrorKind::NotYetValid,
            },
        }
    }
}

impl ResponseError for Rejection {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            AuthErrorKind::NoToken => StatusCode::UNAUTHORIZED,
            _ => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());

        if self.kind() == AuthErrorKind::NoToken {
            response.insert_header((header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer")));
        }

        response.json(HttpErrorResponse::from(self.kind()))
    }
}
