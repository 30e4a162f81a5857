use crate::rejection::Rejection;
use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, Ready};
use std::ops::Deref;
use std::sync::Arc;
use token_codec::IdentityClaim;

/// Verified identity of the caller, read-only for handlers
///
/// Inserted into request extensions by the gatekeeper middleware; this is the
/// only way a handler learns who is calling.
#[derive(Debug, Clone)]
pub struct Identity(Arc<IdentityClaim>);

impl Identity {
    pub fn new(claim: IdentityClaim) -> Self {
        Self(Arc::new(claim))
    }

    pub fn claim(&self) -> &IdentityClaim {
        &self.0
    }
}

impl Deref for Identity {
    type Target = IdentityClaim;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Missing identity means the route was mounted outside the gatekeeper
impl FromRequest for Identity {
    type Error = Rejection;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(req.extensions().get::<Identity>().cloned().ok_or(Rejection::NoToken))
    }
}
