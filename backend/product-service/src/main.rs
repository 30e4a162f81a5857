use actix_gatekeeper::{GatekeeperMiddleware, RequestLogging};
use actix_web::{App, HttpServer};
use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = match product_service::Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            std::process::exit(1);
        }
    };

    // No policy, no service: never start with a default or missing key
    let policy = match config_core::load_policy(config.gatekeeper_config.as_deref()) {
        Ok(policy) => policy,
        Err(e) => {
            tracing::error!("Verification policy provisioning failed: {}", e);
            std::process::exit(1);
        }
    };

    let gatekeeper = GatekeeperMiddleware::new(policy);

    tracing::info!(
        env = %config.env,
        host = %config.host,
        port = config.port,
        "Starting product-service"
    );

    HttpServer::new(move || {
        let gatekeeper = gatekeeper.clone();
        App::new()
            .wrap(RequestLogging)
            .configure(|cfg| product_service::configure(cfg, gatekeeper))
    })
    .bind((config.host.as_str(), config.port))
    .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?
    .run()
    .await
    .context("HTTP server terminated with an error")?;

    Ok(())
}
