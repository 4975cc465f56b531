// HTTP-level tests for billing routes that must reject a request before
// reaching Stripe or the database.

use std::sync::Arc;

use actix_web::{App, HttpMessage, dev::Service, http::StatusCode, test, web};
use common::{
    env_config::{Config, JwtConfig},
    jwt::JwtClaims,
};
use sqlx::{PgPool, postgres::PgPoolOptions};
use uuid::Uuid;

fn config() -> Arc<Config> {
    Arc::new(Config {
        jwt_config: JwtConfig {
            secret: "billing-routes-test-secret".to_string(),
            expiration_hours: 1,
        },
        stripe_webhook_secret: "whsec_billing_test".to_string(),
        ..Default::default()
    })
}

fn lazy_pool() -> Arc<PgPool> {
    Arc::new(
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/faceswap_test")
            .unwrap(),
    )
}

fn claims() -> JwtClaims {
    JwtClaims {
        user_id: Uuid::new_v4(),
        session_id: Uuid::new_v4(),
        email: "ada@example.com".to_string(),
        exp: usize::MAX,
    }
}

/// Secured routes with the session check replaced by fixed claims.
macro_rules! authenticated_app {
    () => {{
        let claims = claims();
        test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .app_data(web::Data::new(config()))
                .app_data(common::http::json_config())
                .app_data(common::http::query_config())
                .wrap_fn(move |req, srv| {
                    req.extensions_mut().insert(claims.clone());
                    srv.call(req)
                })
                .service(
                    web::scope("/api/secured")
                        .service(api_billing::mount_checkout())
                        .service(api_billing::mount_pay())
                        .service(api_billing::mount_subscription())
                        .service(api_billing::mount_credits()),
                ),
        )
        .await
    }};
}

async fn assert_error(resp: actix_web::dev::ServiceResponse, status: StatusCode) {
    assert_eq!(resp.status(), status);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn credits_require_authentication() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(lazy_pool()))
            .app_data(web::Data::new(config()))
            .wrap(extractor::middleware())
            .service(
                web::scope("/api/secured")
                    .wrap(api_auth::auth_middleware())
                    .service(api_billing::mount_credits()),
            ),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/secured/credits/balance")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error(resp, StatusCode::UNAUTHORIZED).await;
}

#[actix_web::test]
async fn checkout_with_relative_success_url_is_bad_request() {
    let app = authenticated_app!();
    let req = test::TestRequest::post()
        .uri("/api/secured/checkout")
        .set_json(serde_json::json!({
            "package_id": Uuid::new_v4(),
            "success_url": "/billing/success",
            "cancel_url": "https://app.example.com/billing"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error(resp, StatusCode::BAD_REQUEST).await;
}

#[actix_web::test]
async fn checkout_with_malformed_package_id_is_bad_request() {
    let app = authenticated_app!();
    let req = test::TestRequest::post()
        .uri("/api/secured/checkout")
        .set_json(serde_json::json!({
            "package_id": "starter",
            "success_url": "https://app.example.com/ok",
            "cancel_url": "https://app.example.com/billing"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error(resp, StatusCode::BAD_REQUEST).await;
}

#[actix_web::test]
async fn payment_intent_without_package_is_bad_request() {
    let app = authenticated_app!();
    let req = test::TestRequest::post()
        .uri("/api/secured/pay/payment-intent")
        .set_json(serde_json::json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error(resp, StatusCode::BAD_REQUEST).await;
}

#[actix_web::test]
async fn subscribe_without_price_is_bad_request() {
    let app = authenticated_app!();
    let req = test::TestRequest::post()
        .uri("/api/secured/subscription/subscribe")
        .set_json(serde_json::json!({
            "price_id": " ",
            "success_url": "https://app.example.com/ok",
            "cancel_url": "https://app.example.com/billing"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error(resp, StatusCode::BAD_REQUEST).await;
}

#[actix_web::test]
async fn auto_renew_without_subscription_id_is_bad_request() {
    let app = authenticated_app!();
    let req = test::TestRequest::post()
        .uri("/api/secured/subscription/auto-renew")
        .set_json(serde_json::json!({ "subscription_id": "", "auto_renew": false }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error(resp, StatusCode::BAD_REQUEST).await;
}

#[actix_web::test]
async fn transactions_with_non_numeric_limit_is_bad_request() {
    let app = authenticated_app!();
    let req = test::TestRequest::get()
        .uri("/api/secured/credits/transactions?limit=many")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error(resp, StatusCode::BAD_REQUEST).await;
}

macro_rules! webhook_app {
    () => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .app_data(web::Data::new(config()))
                .service(web::scope("/api").service(api_billing::mount_webhook())),
        )
        .await
    };
}

#[actix_web::test]
async fn webhook_without_signature_is_bad_request() {
    let app = webhook_app!();
    let req = test::TestRequest::post()
        .uri("/api/pay/webhook")
        .set_payload(r#"{"type":"payment_intent.succeeded"}"#)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error(resp, StatusCode::BAD_REQUEST).await;
}

#[actix_web::test]
async fn webhook_with_forged_signature_is_bad_request() {
    let app = webhook_app!();
    let req = test::TestRequest::post()
        .uri("/api/pay/webhook")
        .insert_header(("Stripe-Signature", "t=1700000000,v1=0badc0ffee"))
        .set_payload(r#"{"type":"payment_intent.succeeded"}"#)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error(resp, StatusCode::BAD_REQUEST).await;
}
