use std::sync::Arc;

use actix_web::{Responder, post, web};
use common::{
    env_config::Config, error::Res, http::Success, jwt::JwtClaims, misc::validate_redirect_url,
    stripe,
};
use sqlx::PgPool;

use crate::dtos::checkout::{
    CheckoutRequest, CheckoutResponse, PaymentIntentRequest, PaymentIntentResponse,
};
use crate::services;

/// Starts a Stripe-hosted checkout for a credit package.
///
/// # Input
/// - `req`: JSON payload with `package_id`, `success_url` and `cancel_url`
///
/// # Output
/// - Success: 201 Created with `{ success, session_id, url }`
/// - Error: 400 for invalid redirect URLs, 404 for unknown or inactive packages
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/secured/checkout', {
///   method: 'POST',
///   headers: {
///     'Content-Type': 'application/json',
///     'Authorization': `Bearer ${localStorage.getItem('authToken')}`
///   },
///   body: JSON.stringify({
///     package_id: pkg.id,
///     success_url: 'https://yourapp.com/billing/success',
///     cancel_url: 'https://yourapp.com/billing'
///   })
/// });
/// const { url } = await response.json();
/// window.location.href = url;
/// ```
#[post("")]
pub async fn post_checkout(
    claims: web::ReqData<JwtClaims>,
    req: web::Json<CheckoutRequest>,
    pool: web::Data<Arc<PgPool>>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    validate_redirect_url("success_url", &req.success_url)?;
    validate_redirect_url("cancel_url", &req.cancel_url)?;

    let pg_pool: &PgPool = &pool;
    let package = services::checkout::get_package(pg_pool, req.package_id).await?;

    let client = stripe::create_client(&config.stripe_secret_key);
    let customer_id =
        services::customer::ensure_customer(pg_pool, &client, claims.user_id).await?;

    let session = services::checkout::create_package_session(
        &client,
        customer_id,
        claims.user_id,
        &package,
        &req.success_url,
        &req.cancel_url,
    )
    .await?;

    log::info!(
        "Checkout session {} created for user {} ({})",
        session.id,
        claims.user_id,
        package.name
    );
    Success::created(CheckoutResponse {
        session_id: session.id.to_string(),
        url: session.url,
    })
}

/// Creates a payment intent for a credit package, to be confirmed client side
/// with Stripe.js.
///
/// # Output
/// - Success: 201 Created with `{ success, payment_intent_id, client_secret }`
/// - Error: 404 for unknown or inactive packages
#[post("/payment-intent")]
pub async fn post_payment_intent(
    claims: web::ReqData<JwtClaims>,
    req: web::Json<PaymentIntentRequest>,
    pool: web::Data<Arc<PgPool>>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let pg_pool: &PgPool = &pool;
    let package = services::checkout::get_package(pg_pool, req.package_id).await?;

    let client = stripe::create_client(&config.stripe_secret_key);
    let customer_id =
        services::customer::ensure_customer(pg_pool, &client, claims.user_id).await?;

    let intent = services::checkout::create_package_payment_intent(
        &client,
        customer_id,
        claims.user_id,
        &package,
    )
    .await?;

    Success::created(PaymentIntentResponse {
        payment_intent_id: intent.id.to_string(),
        client_secret: intent.client_secret,
    })
}
