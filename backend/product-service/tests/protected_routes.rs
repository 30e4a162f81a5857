use actix_gatekeeper::GatekeeperMiddleware;
use actix_web::http::header::AUTHORIZATION;
use actix_web::http::StatusCode;
use actix_web::{test, App};
use serde_json::Value;
use token_codec::{encode, Algorithm, IdentityClaim, KeyMaterial, SigningKey, VerificationPolicy};

const SECRET: &str = "q8Vn2LrT5xWz9KcB4mJd7HsF1gYp6NaE";

fn gatekeeper() -> GatekeeperMiddleware<VerificationPolicy> {
    let policy = VerificationPolicy::new(KeyMaterial::secret(SECRET), vec![Algorithm::HS256]).unwrap();
    GatekeeperMiddleware::new(policy)
}

#[actix_web::test]
async fn test_health_is_public() {
    let app = test::init_service(
        App::new().configure(|cfg| product_service::configure(cfg, gatekeeper())),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn test_me_requires_token() {
    let app = test::init_service(
        App::new().configure(|cfg| product_service::configure(cfg, gatekeeper())),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_me_returns_caller_identity() {
    let app = test::init_service(
        App::new().configure(|cfg| product_service::configure(cfg, gatekeeper())),
    )
    .await;

    let now = chrono::Utc::now().timestamp();
    let claim = IdentityClaim::new(4242, now)
        .with_role("vendor")
        .with_expiry(now + 600);
    let token = encode(&claim, &SigningKey::secret(SECRET), Algorithm::HS256).unwrap();

    let req = test::TestRequest::get()
        .uri("/api/v1/me")
        .insert_header((AUTHORIZATION, format!("Bearer {token}")))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["sub"], 4242);
    assert_eq!(body["role"], "vendor");
    assert_eq!(body["issued_at"], now);
    assert_eq!(body["expires_at"], now + 600);
}

#[actix_web::test]
async fn test_metrics_exposes_decisions() {
    let app = test::init_service(
        App::new().configure(|cfg| product_service::configure(cfg, gatekeeper())),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/me")
        .insert_header((AUTHORIZATION, "Bearer garbage"))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = test::read_body(resp).await;
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("gatekeeper_decisions_total"));
    assert!(text.contains("reason=\"MalformedToken\""));
}
