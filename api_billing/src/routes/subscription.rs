use std::sync::Arc;

use actix_web::{Responder, get, post, web};
use common::{
    env_config::Config,
    error::{AppError, Res},
    http::Success,
    jwt::JwtClaims,
    misc::validate_redirect_url,
    stripe,
};
use sqlx::PgPool;

use crate::dtos::{
    checkout::CheckoutResponse,
    subscription::{AutoRenewRequest, SubscribeRequest, SubscriptionStatusResponse},
};
use crate::services;

/// Returns the caller's active subscription and refreshes the local mirror.
///
/// # Output
/// - Success: `{ success, subscription }`, `subscription` is `null` without an active plan
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/secured/subscription/status', {
///   headers: { 'Authorization': `Bearer ${localStorage.getItem('authToken')}` }
/// });
/// const { subscription } = await response.json();
/// if (subscription && subscription.cancel_at_period_end) {
///   showRenewalBanner(subscription.current_period_end);
/// }
/// ```
#[get("/status")]
pub async fn get_status(
    claims: web::ReqData<JwtClaims>,
    pool: web::Data<Arc<PgPool>>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let pg_pool: &PgPool = &pool;

    // users who never paid have no customer and nothing to ask Stripe about
    let Some(customer_id) = services::customer::find_customer_id(pg_pool, claims.user_id).await?
    else {
        return Success::ok(SubscriptionStatusResponse { subscription: None });
    };

    let client = stripe::create_client(&config.stripe_secret_key);
    let subscription =
        match services::subscription::get_active_subscription(&client, &customer_id).await? {
            Some(subscription) => Some(
                db::billing::upsert_subscription(
                    pg_pool,
                    services::subscription::snapshot(&subscription),
                )
                .await?,
            ),
            None => None,
        };

    Success::ok(SubscriptionStatusResponse { subscription })
}

/// Creates a subscription checkout session for the authenticated user.
///
/// # Input
/// - `req`: JSON payload with `price_id`, `success_url` and `cancel_url`
///
/// # Output
/// - Success: 201 Created with `{ success, session_id, url }`
/// - Error: 400 for a missing price or invalid redirect URLs
#[post("/subscribe")]
pub async fn post_subscribe(
    claims: web::ReqData<JwtClaims>,
    req: web::Json<SubscribeRequest>,
    pool: web::Data<Arc<PgPool>>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let price_id = req.price_id.trim();
    if price_id.is_empty() {
        return Err(AppError::BadRequest("price_id is required".to_string()));
    }
    validate_redirect_url("success_url", &req.success_url)?;
    validate_redirect_url("cancel_url", &req.cancel_url)?;

    let pg_pool: &PgPool = &pool;
    let client = stripe::create_client(&config.stripe_secret_key);
    let customer_id =
        services::customer::ensure_customer(pg_pool, &client, claims.user_id).await?;

    let session = services::subscription::create_subscription_session(
        &client,
        customer_id,
        claims.user_id,
        price_id,
        &req.success_url,
        &req.cancel_url,
    )
    .await?;

    Success::created(CheckoutResponse {
        session_id: session.id.to_string(),
        url: session.url,
    })
}

/// Turns automatic renewal on or off for one of the caller's subscriptions.
///
/// # Output
/// - Success: `{ success, subscription }` with the updated mirror row
/// - Error: 403 Forbidden when the subscription belongs to someone else
#[post("/auto-renew")]
pub async fn post_auto_renew(
    claims: web::ReqData<JwtClaims>,
    req: web::Json<AutoRenewRequest>,
    pool: web::Data<Arc<PgPool>>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    if req.subscription_id.trim().is_empty() {
        return Err(AppError::BadRequest("subscription_id is required".to_string()));
    }

    let pg_pool: &PgPool = &pool;
    let customer_id = services::customer::find_customer_id(pg_pool, claims.user_id)
        .await?
        .ok_or_else(|| {
            AppError::Forbidden(
                "You don't have permission to modify this subscription".to_string(),
            )
        })?;

    let client = stripe::create_client(&config.stripe_secret_key);
    let subscription = services::subscription::update_auto_renew(
        &client,
        &customer_id,
        req.subscription_id.trim(),
        req.auto_renew,
    )
    .await?;

    let mirrored =
        db::billing::upsert_subscription(pg_pool, services::subscription::snapshot(&subscription))
            .await?;
    log::info!(
        "Subscription {} auto renew set to {} by user {}",
        mirrored.id,
        req.auto_renew,
        claims.user_id
    );

    Success::ok(SubscriptionStatusResponse {
        subscription: Some(mirrored),
    })
}
