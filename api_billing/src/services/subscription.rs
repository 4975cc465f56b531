use std::collections::HashMap;

use common::error::{AppError, Res};
use db::dtos::billing::SubscriptionUpsertRequest;
use stripe::{
    CheckoutSession, CheckoutSessionMode, Client, CreateCheckoutSession, CustomerId, Subscription,
    SubscriptionId,
};
use uuid::Uuid;

/// Local mirror row for a Stripe subscription object.
pub fn snapshot(subscription: &Subscription) -> SubscriptionUpsertRequest {
    SubscriptionUpsertRequest {
        id: subscription.id.to_string(),
        customer_id: subscription.customer.id().to_string(),
        price_id: subscription
            .items
            .data
            .first()
            .and_then(|item| item.price.as_ref())
            .map(|price| price.id.to_string())
            .unwrap_or_default(),
        status: subscription.status.to_string(),
        current_period_end: subscription.current_period_end,
        cancel_at_period_end: subscription.cancel_at_period_end,
    }
}

/// Customer's active subscription on Stripe, if any.
pub async fn get_active_subscription(
    client: &Client,
    customer_id: &CustomerId,
) -> Res<Option<Subscription>> {
    let subscriptions = Subscription::list(
        client,
        &stripe::ListSubscriptions {
            customer: Some(customer_id.clone()),
            status: Some(stripe::SubscriptionStatusFilter::Active),
            limit: Some(1),
            ..Default::default()
        },
    )
    .await
    .map_err(AppError::from)?;

    Ok(subscriptions.data.into_iter().next())
}

/// Creates a subscription-mode checkout session for a given customer.
pub async fn create_subscription_session(
    client: &Client,
    customer_id: CustomerId,
    user_id: Uuid,
    price_id: &str,
    success_url: &str,
    cancel_url: &str,
) -> Res<CheckoutSession> {
    let user_id_str = user_id.to_string();
    let params = CreateCheckoutSession {
        payment_method_types: Some(vec![stripe::CreateCheckoutSessionPaymentMethodTypes::Card]),
        line_items: Some(vec![stripe::CreateCheckoutSessionLineItems {
            price: Some(price_id.to_string()),
            quantity: Some(1),
            ..Default::default()
        }]),
        mode: Some(CheckoutSessionMode::Subscription),
        success_url: Some(success_url),
        cancel_url: Some(cancel_url),
        customer: Some(customer_id),
        client_reference_id: Some(&user_id_str),
        metadata: Some(HashMap::from([(
            "user_id".to_string(),
            user_id_str.clone(),
        )])),
        ..Default::default()
    };
    CheckoutSession::create(client, params)
        .await
        .map_err(AppError::from)
}

/// Toggles renewal on a subscription owned by `customer_id`.
/// Stripe expresses "no auto renew" as `cancel_at_period_end`.
pub async fn update_auto_renew(
    client: &Client,
    customer_id: &CustomerId,
    subscription_id: &str,
    auto_renew: bool,
) -> Res<Subscription> {
    let sub_id = subscription_id
        .parse::<SubscriptionId>()
        .map_err(|e| AppError::BadRequest(format!("Invalid subscription ID: {}", e)))?;

    let subscription = Subscription::retrieve(client, &sub_id, &[])
        .await
        .map_err(AppError::from)?;

    if subscription.customer.id() != *customer_id {
        return Err(AppError::Forbidden(
            "You don't have permission to modify this subscription".to_string(),
        ));
    }

    Subscription::update(
        client,
        &sub_id,
        stripe::UpdateSubscription {
            cancel_at_period_end: Some(!auto_renew),
            ..Default::default()
        },
    )
    .await
    .map_err(AppError::from)
}
