mod cors;

use std::sync::Arc;

use actix_web::{
    App, HttpServer,
    web::{self},
};
use api_swap::{FaceSwapProvider, HttpFaceSwapProvider};
use api_uploads::{ObjectStorage, SupabaseStorage};
use common::env_config::Config;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // get env vars
    let config = Config::from_env();
    let config_data = config.clone();

    // get info
    let is_production = config.is_production();
    let origin = config.cors_allowed_origin.clone();
    let cookie_secure = !origin.contains("localhost");

    // init logger
    if config.console_logging_enabled {
        logger::setup().expect("Failed to set up logger");
    }

    // init db connection
    let pool = db::setup(&config.database_url, is_production)
        .await
        .expect("Failed to set up database");

    // external services
    if !config.storage.is_configured() {
        log::warn!("Object storage is not configured, uploads will fail");
    }
    if !config.face_swap.is_configured() {
        log::warn!("Face-swap provider is not configured, swaps will fail");
    }
    let storage: Arc<dyn ObjectStorage> = Arc::new(SupabaseStorage::new(&config.storage));
    let provider: Arc<dyn FaceSwapProvider> =
        Arc::new(HttpFaceSwapProvider::new(&config.face_swap));

    // one key for every worker, so cookies survive across them
    let session_key = api_auth::session_key(&config.jwt_config.secret);

    log::info!(
        "Starting server on {}:{} ({})",
        config.server_host,
        config.server_port,
        config.environment
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config_data.clone()))
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(provider.clone()))
            .app_data(common::http::json_config())
            .app_data(common::http::query_config())
            .app_data(common::http::path_config())
            .wrap(logger::middleware(config_data.console_logging_enabled)) // 4th
            .wrap(extractor::middleware()) // 3rd
            .wrap(cors::middleware(&origin)) // 2nd
            .wrap(api_auth::session_middleware(
                cookie_secure,
                session_key.clone(),
            )) // 1st
            .service(
                web::scope("/api")
                    .configure(api_status::configure_status)
                    .service(api_auth::mount_auth())
                    .service(api_billing::mount_packages())
                    .service(api_billing::mount_webhook())
                    .service(
                        web::scope("/secured")
                            .wrap(api_auth::auth_middleware())
                            .configure(api_auth::configure_user)
                            .service(api_uploads::mount_upload())
                            .service(api_billing::mount_checkout())
                            .service(api_billing::mount_pay())
                            .service(api_billing::mount_subscription())
                            .service(api_billing::mount_credits())
                            .service(api_swap::mount_swap()),
                    ),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .workers(config.num_workers)
    .run()
    .await
}
