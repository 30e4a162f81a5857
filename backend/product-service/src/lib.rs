/// Product Service Library
///
/// Reference service protected by the gatekeeper. Every route under
/// `/api/v1` requires a bearer token accepted by the shared verification
/// policy; `/health` and `/metrics` stay open for probes and scrapers.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers
/// - `config`: Configuration management
pub mod config;
pub mod handlers;

pub use config::Config;

use actix_gatekeeper::GatekeeperMiddleware;
use actix_web::web;
use token_codec::TokenVerifier;

/// Register routes, wrapping the protected scope with `gatekeeper`
pub fn configure<V>(cfg: &mut web::ServiceConfig, gatekeeper: GatekeeperMiddleware<V>)
where
    V: TokenVerifier + 'static,
{
    cfg.route("/health", web::get().to(handlers::health::health))
        .route("/metrics", web::get().to(handlers::metrics::serve_metrics))
        .service(
            web::scope("/api/v1")
                .wrap(gatekeeper)
                .route("/me", web::get().to(handlers::me::whoami)),
        );
}
