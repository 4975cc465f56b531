// HTTP-level tests for the auth scope.
//
// Most tests use a lazy pool and only reach requests rejected before the
// database. The `sqlx::test` ones get a migrated database of their own.

use std::sync::Arc;

use actix_web::{App, http::StatusCode, test, web};
use common::env_config::{Config, JwtConfig};
use sqlx::{PgPool, postgres::PgPoolOptions};

fn config() -> Arc<Config> {
    Arc::new(Config {
        jwt_config: JwtConfig {
            secret: "auth-routes-test-secret".to_string(),
            expiration_hours: 1,
        },
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

macro_rules! app {
    () => {
        app!(lazy_pool())
    };
    ($pool:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($pool))
                .app_data(web::Data::new(config()))
                .app_data(common::http::json_config())
                .wrap(extractor::middleware())
                .wrap(api_auth::session_middleware(
                    false,
                    api_auth::session_key("too-short-for-derivation"),
                ))
                .service(
                    web::scope("/api").service(api_auth::mount_auth()).service(
                        web::scope("/secured")
                            .wrap(api_auth::auth_middleware())
                            .configure(api_auth::configure_user),
                    ),
                ),
        )
        .await
    };
}

async fn assert_error(resp: actix_web::dev::ServiceResponse, status: StatusCode) {
    assert_eq!(resp.status(), status);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn secured_route_without_token_is_unauthorized() {
    let app = app!();
    let req = test::TestRequest::get().uri("/api/secured/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_error(resp, StatusCode::UNAUTHORIZED).await;
}

#[actix_web::test]
async fn secured_route_with_invalid_token_is_unauthorized() {
    let app = app!();
    let req = test::TestRequest::get()
        .uri("/api/secured/me")
        .insert_header(("Authorization", "Bearer not.a.token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error(resp, StatusCode::UNAUTHORIZED).await;
}

#[actix_web::test]
async fn register_with_short_password_is_bad_request() {
    let app = app!();
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(serde_json::json!({
            "email": "ada@example.com",
            "password": "short",
            "name": "Ada"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error(resp, StatusCode::BAD_REQUEST).await;
}

#[actix_web::test]
async fn register_with_malformed_email_is_bad_request() {
    let app = app!();
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(serde_json::json!({
            "email": "not-an-email",
            "password": "long enough password",
            "name": "Ada"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error(resp, StatusCode::BAD_REQUEST).await;
}

#[actix_web::test]
async fn register_with_missing_fields_is_bad_request() {
    let app = app!();
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(serde_json::json!({ "email": "ada@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error(resp, StatusCode::BAD_REQUEST).await;
}

#[actix_web::test]
async fn unknown_oauth_provider_is_bad_request() {
    let app = app!();
    let req = test::TestRequest::get()
        .uri("/api/auth/oauth/myspace")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error(resp, StatusCode::BAD_REQUEST).await;
}

#[actix_web::test]
async fn unconfigured_oauth_provider_is_bad_request() {
    let app = app!();
    let req = test::TestRequest::get()
        .uri("/api/auth/oauth/github")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error(resp, StatusCode::BAD_REQUEST).await;
}

#[actix_web::test]
async fn oauth_callback_without_state_is_bad_request() {
    let app = app!();
    let req = test::TestRequest::get()
        .uri("/api/auth/oauth/google/callback?code=abc")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error(resp, StatusCode::BAD_REQUEST).await;
}

#[actix_web::test]
async fn session_without_cookie_is_unauthorized() {
    let app = app!();
    let req = test::TestRequest::get().uri("/api/auth/session").to_request();
    let resp = test::call_service(&app, req).await;
    assert_error(resp, StatusCode::UNAUTHORIZED).await;
}

#[actix_web::test]
async fn logout_without_token_is_unauthorized() {
    let app = app!();
    let req = test::TestRequest::post().uri("/api/auth/logout").to_request();
    let resp = test::call_service(&app, req).await;
    assert_error(resp, StatusCode::UNAUTHORIZED).await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn register_then_login_reaches_secured_routes(pool: PgPool) {
    let app = app!(Arc::new(pool));

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(serde_json::json!({
            "email": "Ada@Example.com",
            "password": "correct horse battery",
            "name": "Ada"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["email_verified"], false);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(serde_json::json!({
            "email": "ada@example.com",
            "password": "another long password",
            "name": "Ada Again"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error(resp, StatusCode::BAD_REQUEST).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(serde_json::json!({
            "email": "ada@example.com",
            "password": "wrong password"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error(resp, StatusCode::UNAUTHORIZED).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(serde_json::json!({
            "email": "ada@example.com",
            "password": "correct horse battery"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let token = body["token"].as_str().unwrap().to_string();
    assert_eq!(body["user"]["email"], "ada@example.com");

    let req = test::TestRequest::get()
        .uri("/api/secured/me")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["name"], "Ada");
}
