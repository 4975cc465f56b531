use std::sync::Arc;

use actix_web::{App, test, web};
use common::env_config::{Config, JwtConfig, StorageConfig};

#[actix_web::test]
async fn health_reports_ok() {
    let app = test::init_service(
        App::new().service(web::scope("/api").configure(api_status::configure_status)),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

#[actix_web::test]
async fn env_reports_configuration_without_secrets() {
    let config = Arc::new(Config {
        environment: "production".to_string(),
        database_url: "postgres://app:db-password-123@db/faceswap".to_string(),
        jwt_config: JwtConfig {
            secret: "jwt-secret-456".to_string(),
            expiration_hours: 24,
        },
        stripe_secret_key: "sk_test_789".to_string(),
        storage: StorageConfig {
            url: "https://xyz.supabase.co".to_string(),
            service_key: "service-key-000".to_string(),
            bucket: "uploads".to_string(),
        },
        ..Default::default()
    });

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(config))
            .service(web::scope("/api").configure(api_status::configure_status)),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/env").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["environment"], "production");
    assert_eq!(body["integrations"]["database"], true);
    assert_eq!(body["integrations"]["stripe"], true);
    assert_eq!(body["integrations"]["stripe_webhook"], false);
    assert_eq!(body["integrations"]["storage"], true);
    assert_eq!(body["integrations"]["face_swap"], false);
    assert_eq!(body["integrations"]["github_oauth"], false);

    let raw = body.to_string();
    for secret in ["db-password-123", "jwt-secret-456", "sk_test_789", "service-key-000"] {
        assert!(!raw.contains(secret), "{} leaked", secret);
    }
}
