use crate::gatekeeper::Gatekeeper;
use crate::identity::Identity;
use crate::metrics;
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::sync::Arc;
use token_codec::TokenVerifier;

/// Gatekeeper middleware
///
/// Wrap every protected scope with the same policy:
///
/// ```rust,ignore
/// App::new().service(
///     web::scope("/api/v1")
///         .wrap(GatekeeperMiddleware::new(policy.clone()))
///         .route("/me", web::get().to(me)),
/// )
/// ```
///
/// A rejected request never reaches the wrapped service.
pub struct GatekeeperMiddleware<V> {
    gatekeeper: Arc<Gatekeeper<V>>,
}

impl<V: TokenVerifier> GatekeeperMiddleware<V> {
    pub fn new(verifier: V) -> Self {
        Self::from_gatekeeper(Arc::new(Gatekeeper::new(verifier)))
    }

    pub fn from_gatekeeper(gatekeeper: Arc<Gatekeeper<V>>) -> Self {
        Self { gatekeeper }
    }
}

impl<V> Clone for GatekeeperMiddleware<V> {
    fn clone(&self) -> Self {
        Self {
            gatekeeper: Arc::clone(&self.gatekeeper),
        }
    }
}

impl<S, B, V> Transform<S, ServiceRequest> for GatekeeperMiddleware<V>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
    V: TokenVerifier + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = GatekeeperMiddlewareService<S, V>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(GatekeeperMiddlewareService {
            service,
            gatekeeper: Arc::clone(&self.gatekeeper),
        }))
    }
}

pub struct GatekeeperMiddlewareService<S, V> {
    service: S,
    gatekeeper: Arc<Gatekeeper<V>>,
}

impl<S, B, V> Service<ServiceRequest> for GatekeeperMiddlewareService<S, V>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
    V: TokenVerifier + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match self.gatekeeper.admit(req.headers()) {
            Ok(claim) => {
                metrics::record_admitted();
                tracing::debug!(path = %req.path(), "Request admitted");

                req.extensions_mut().insert(Identity::new(claim));

                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(rejection) => {
                let kind = rejection.kind();
                kind.log(req.path());
                metrics::record_rejected(kind);

                let response = req
                    .into_response(rejection.error_response())
                    .map_into_right_body();
                Box::pin(ready(Ok(response)))
            }
        }
    }
}
