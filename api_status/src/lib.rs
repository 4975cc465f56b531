use std::sync::Arc;

use actix_web::{Responder, get, web};
use chrono::{DateTime, Utc};
use common::{env_config::Config, error::Res, http::Success};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Which integrations have credentials. Only booleans, never the values.
#[derive(Debug, Serialize)]
pub struct IntegrationStatus {
    pub database: bool,
    pub stripe: bool,
    pub stripe_webhook: bool,
    pub storage: bool,
    pub face_swap: bool,
    pub google_oauth: bool,
    pub github_oauth: bool,
}

#[derive(Debug, Serialize)]
pub struct EnvResponse {
    pub environment: String,
    pub version: &'static str,
    pub integrations: IntegrationStatus,
}

impl From<&Config> for EnvResponse {
    fn from(config: &Config) -> Self {
        EnvResponse {
            environment: config.environment.clone(),
            version: env!("CARGO_PKG_VERSION"),
            integrations: IntegrationStatus {
                database: !config.database_url.is_empty(),
                stripe: !config.stripe_secret_key.is_empty(),
                stripe_webhook: !config.stripe_webhook_secret.is_empty(),
                storage: config.storage.is_configured(),
                face_swap: config.face_swap.is_configured(),
                google_oauth: config.google_client.is_configured(),
                github_oauth: config.github_client.is_configured(),
            },
        }
    }
}

/// Liveness probe.
#[get("/health")]
async fn get_health() -> Res<impl Responder> {
    Success::ok(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}

/// Reports the environment and which integrations are configured.
#[get("/env")]
async fn get_env(config: web::Data<Arc<Config>>) -> Res<impl Responder> {
    log::debug!("Environment diagnostics requested");
    Success::ok(EnvResponse::from(config.get_ref().as_ref()))
}

/// Registers `/health` and `/env` on the enclosing scope.
pub fn configure_status(cfg: &mut web::ServiceConfig) {
    cfg.service(get_health).service(get_env);
}
