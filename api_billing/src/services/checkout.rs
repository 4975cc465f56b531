use std::collections::HashMap;

use common::error::{AppError, Res};
use db::models::credit::CreditPackage;
use stripe::{
    CheckoutSession, CheckoutSessionMode, Client, CreateCheckoutSession, CreatePaymentIntent,
    Currency, CustomerId, PaymentIntent,
};
use uuid::Uuid;

pub const METADATA_USER_ID: &str = "user_id";
pub const METADATA_PACKAGE_ID: &str = "package_id";
pub const METADATA_CREDITS: &str = "credits";

/// Metadata read back by the webhook to grant credits.
pub fn credit_metadata(user_id: Uuid, package: &CreditPackage) -> HashMap<String, String> {
    HashMap::from([
        (METADATA_USER_ID.to_string(), user_id.to_string()),
        (METADATA_PACKAGE_ID.to_string(), package.id.to_string()),
        (METADATA_CREDITS.to_string(), package.credits.to_string()),
    ])
}

pub async fn get_package(pool: &sqlx::PgPool, package_id: Uuid) -> Res<CreditPackage> {
    db::credit::get_active_package_by_id(pool, package_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Credit package {} not found", package_id)))
}

/// Creates a payment-mode checkout session for one credit package.
/// Only the session carries credit metadata, so the payment intent created
/// behind it never triggers a second grant.
pub async fn create_package_session(
    client: &Client,
    customer_id: CustomerId,
    user_id: Uuid,
    package: &CreditPackage,
    success_url: &str,
    cancel_url: &str,
) -> Res<CheckoutSession> {
    let user_id_str = user_id.to_string();
    let params = CreateCheckoutSession {
        payment_method_types: Some(vec![stripe::CreateCheckoutSessionPaymentMethodTypes::Card]),
        line_items: Some(vec![stripe::CreateCheckoutSessionLineItems {
            price_data: Some(stripe::CreateCheckoutSessionLineItemsPriceData {
                currency: Currency::USD,
                product_data: Some(stripe::CreateCheckoutSessionLineItemsPriceDataProductData {
                    name: package.name.clone(),
                    description: package.description.clone(),
                    ..Default::default()
                }),
                unit_amount: Some(package.price_cents),
                ..Default::default()
            }),
            quantity: Some(1),
            ..Default::default()
        }]),
        mode: Some(CheckoutSessionMode::Payment),
        success_url: Some(success_url),
        cancel_url: Some(cancel_url),
        customer: Some(customer_id),
        client_reference_id: Some(&user_id_str),
        metadata: Some(credit_metadata(user_id, package)),
        ..Default::default()
    };
    CheckoutSession::create(client, params)
        .await
        .map_err(AppError::from)
}

/// Creates a payment intent for one credit package, for clients that
/// confirm the payment themselves.
pub async fn create_package_payment_intent(
    client: &Client,
    customer_id: CustomerId,
    user_id: Uuid,
    package: &CreditPackage,
) -> Res<PaymentIntent> {
    let description = format!("{} credits ({})", package.credits, package.name);
    let mut params = CreatePaymentIntent::new(package.price_cents, Currency::USD);
    params.customer = Some(customer_id);
    params.description = Some(&description);
    params.metadata = Some(credit_metadata(user_id, package));
    params.automatic_payment_methods = Some(stripe::CreatePaymentIntentAutomaticPaymentMethods {
        allow_redirects: None,
        enabled: true,
    });

    PaymentIntent::create(client, params)
        .await
        .map_err(AppError::from)
}
