use actix_gatekeeper::Identity;
use actix_web::HttpResponse;
use serde::Serialize;
use token_codec::Subject;

#[derive(Debug, Serialize)]
pub struct WhoAmIResponse {
    pub sub: Subject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub issued_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

/// Caller's identity as admitted by the gatekeeper
pub async fn whoami(identity: Identity) -> HttpResponse {
    HttpResponse::Ok().json(WhoAmIResponse {
        sub: identity.sub.clone(),
        role: identity.role.clone(),
        issued_at: identity.iat,
        expires_at: identity.exp,
    })
}
