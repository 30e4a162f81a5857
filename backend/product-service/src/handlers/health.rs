use actix_web::HttpResponse;
use chrono::Utc;
use serde_json::json;

/// Liveness probe, unauthenticated
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "product-service",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
