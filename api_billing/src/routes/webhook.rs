use std::sync::Arc;

use actix_web::{HttpRequest, Responder, post, web};
use common::{
    env_config::Config,
    error::{AppError, Res},
    http::Success,
};
use serde_json::{Value, json};
use sqlx::PgPool;

use crate::services;

/// Handles Stripe webhook events.
///
/// # Note
/// This endpoint is called by Stripe, not by the frontend. Configure
/// `https://yourapp.com/api/pay/webhook` in the Stripe Dashboard and set the
/// signing secret as `STRIPE_WEBHOOK_SECRET`.
///
/// # Events Handled
/// - checkout.session.completed: grants the package credits once the session is paid
/// - payment_intent.succeeded: grants credits for payment intents created by this API
/// - customer.subscription.created/updated/deleted: refreshes the local subscription mirror
///
/// Anything else is logged and acknowledged.
#[post("/webhook")]
pub async fn post_webhook(
    payload: String,
    req: HttpRequest,
    pool: web::Data<Arc<PgPool>>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let signature = req
        .headers()
        .get("stripe-signature")
        .and_then(|signature| signature.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Stripe signature missing".to_string()))?;

    if config.stripe_webhook_secret.is_empty() {
        return Err(AppError::Internal(
            "STRIPE_WEBHOOK_SECRET is not configured".to_string(),
        ));
    }

    services::webhook::verify_signature(&payload, signature, &config.stripe_webhook_secret)?;

    let event: Value = serde_json::from_str(&payload)
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook payload: {}", e)))?;

    let pg_pool: &PgPool = &pool;
    services::webhook::process_webhook_event(pg_pool, &event).await?;

    Success::ok(json!({ "received": true }))
}
