use common::error::{AppError, Res};
use db::dtos::billing::SubscriptionUpsertRequest;
use serde_json::Value;
use sqlx::PgPool;
use stripe::{Webhook, WebhookError};
use uuid::Uuid;

use crate::services::checkout::{METADATA_CREDITS, METADATA_PACKAGE_ID, METADATA_USER_ID};

/// Credits to add for one completed payment.
#[derive(Debug, Clone, PartialEq)]
pub struct CreditGrant {
    pub user_id: Uuid,
    pub package_id: Option<Uuid>,
    pub credits: i64,
    /// Checkout session or payment intent id; a grant is applied once per reference.
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WebhookAction {
    GrantCredits(CreditGrant),
    SyncSubscription(SubscriptionUpsertRequest),
    Ignore,
}

/// Checks the `Stripe-Signature` header against the payload.
/// A valid signature over an event the SDK cannot model is still accepted.
pub fn verify_signature(payload: &str, signature: &str, webhook_secret: &str) -> Res<()> {
    match Webhook::construct_event(payload, signature, webhook_secret) {
        Ok(_) | Err(WebhookError::BadParse(_)) => Ok(()),
        Err(e) => {
            log::error!("Error constructing webhook event: {}", e);
            Err(AppError::BadRequest(format!("Webhook Error: {}", e)))
        }
    }
}

fn metadata_grant(object: &Value, reference: &str) -> Res<Option<CreditGrant>> {
    let metadata = &object["metadata"];
    let (Some(user_id), Some(credits)) = (
        metadata[METADATA_USER_ID].as_str(),
        metadata[METADATA_CREDITS].as_str(),
    ) else {
        return Ok(None);
    };

    let user_id = user_id
        .parse::<Uuid>()
        .map_err(|e| AppError::BadRequest(format!("Invalid user_id metadata: {}", e)))?;
    let credits = credits
        .parse::<i64>()
        .ok()
        .filter(|credits| *credits > 0)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid credits metadata: {}", credits)))?;
    let package_id = metadata[METADATA_PACKAGE_ID]
        .as_str()
        .and_then(|id| id.parse::<Uuid>().ok());

    Ok(Some(CreditGrant {
        user_id,
        package_id,
        credits,
        reference: reference.to_string(),
    }))
}

fn subscription_snapshot(object: &Value) -> Option<SubscriptionUpsertRequest> {
    let first_item = &object["items"]["data"][0];
    let customer_id = match &object["customer"] {
        Value::String(id) => id.clone(),
        expanded => expanded["id"].as_str()?.to_string(),
    };

    Some(SubscriptionUpsertRequest {
        id: object["id"].as_str()?.to_string(),
        customer_id,
        price_id: first_item["price"]["id"].as_str().unwrap_or_default().to_string(),
        status: object["status"].as_str()?.to_string(),
        // newer API versions report the period on the item
        current_period_end: object["current_period_end"]
            .as_i64()
            .or_else(|| first_item["current_period_end"].as_i64())
            .unwrap_or(0),
        cancel_at_period_end: object["cancel_at_period_end"].as_bool().unwrap_or(false),
    })
}

/// Decides what a verified event means for local state.
pub fn webhook_action(event: &Value) -> Res<WebhookAction> {
    let event_type = event["type"].as_str().unwrap_or_default();
    let object = &event["data"]["object"];
    let object_id = object["id"].as_str().unwrap_or_default();

    let action = match event_type {
        "checkout.session.completed" => {
            if object["mode"].as_str() == Some("payment")
                && object["payment_status"].as_str() == Some("paid")
            {
                metadata_grant(object, object_id)?
                    .map(WebhookAction::GrantCredits)
                    .unwrap_or(WebhookAction::Ignore)
            } else {
                WebhookAction::Ignore
            }
        }
        "payment_intent.succeeded" => metadata_grant(object, object_id)?
            .map(WebhookAction::GrantCredits)
            .unwrap_or(WebhookAction::Ignore),
        "customer.subscription.created"
        | "customer.subscription.updated"
        | "customer.subscription.deleted" => subscription_snapshot(object)
            .map(WebhookAction::SyncSubscription)
            .ok_or_else(|| AppError::BadRequest("Malformed subscription event".to_string()))?,
        _ => WebhookAction::Ignore,
    };

    Ok(action)
}

/// Applies the action derived from a verified event.
pub async fn process_webhook_event(pool: &PgPool, event: &Value) -> Res<()> {
    let event_type = event["type"].as_str().unwrap_or("unknown");
    log::info!(
        "Processing webhook event {}: {}",
        event["id"].as_str().unwrap_or_default(),
        event_type
    );

    match webhook_action(event)? {
        WebhookAction::GrantCredits(grant) => {
            match super::credit::grant_credits(pool, &grant).await? {
                Some(balance) => log::info!(
                    "Granted {} credits to user {} ({}), balance {}",
                    grant.credits,
                    grant.user_id,
                    grant.reference,
                    balance
                ),
                None => log::info!("Credits for {} were already granted", grant.reference),
            }
        }
        WebhookAction::SyncSubscription(snapshot) => {
            if db::billing::get_customer_by_customer_id(pool, &snapshot.customer_id)
                .await?
                .is_none()
            {
                log::warn!(
                    "Subscription {} belongs to unknown customer {}",
                    snapshot.id,
                    snapshot.customer_id
                );
                return Ok(());
            }
            let subscription = db::billing::upsert_subscription(pool, snapshot).await?;
            log::info!(
                "Subscription {} is now {}",
                subscription.id,
                subscription.status
            );
        }
        WebhookAction::Ignore => {
            log::info!("Unhandled event type: {}", event_type);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn checkout_event(payment_status: &str) -> Value {
        json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": { "object": {
                "id": "cs_test_123",
                "mode": "payment",
                "payment_status": payment_status,
                "metadata": {
                    "user_id": "6f1c1a8e-3f57-4a4c-9a3e-1b2c3d4e5f60",
                    "package_id": "0b7e4c7a-8d55-4f7e-b0a1-2c3d4e5f6a7b",
                    "credits": "50"
                }
            }}
        })
    }

    #[test]
    fn paid_checkout_grants_credits_keyed_by_session() {
        let action = webhook_action(&checkout_event("paid")).unwrap();
        let WebhookAction::GrantCredits(grant) = action else {
            panic!("expected a grant, got {:?}", action);
        };
        assert_eq!(grant.credits, 50);
        assert_eq!(grant.reference, "cs_test_123");
        assert_eq!(
            grant.user_id.to_string(),
            "6f1c1a8e-3f57-4a4c-9a3e-1b2c3d4e5f60"
        );
        assert!(grant.package_id.is_some());
    }

    #[test]
    fn unpaid_checkout_is_ignored() {
        assert_eq!(
            webhook_action(&checkout_event("unpaid")).unwrap(),
            WebhookAction::Ignore
        );
    }

    #[test]
    fn subscription_checkout_does_not_grant() {
        let mut event = checkout_event("paid");
        event["data"]["object"]["mode"] = json!("subscription");
        assert_eq!(webhook_action(&event).unwrap(), WebhookAction::Ignore);
    }

    #[test]
    fn payment_intent_without_metadata_is_ignored() {
        let event = json!({
            "type": "payment_intent.succeeded",
            "data": { "object": { "id": "pi_1", "metadata": {} } }
        });
        assert_eq!(webhook_action(&event).unwrap(), WebhookAction::Ignore);
    }

    #[test]
    fn payment_intent_with_bad_credits_is_rejected() {
        let event = json!({
            "type": "payment_intent.succeeded",
            "data": { "object": { "id": "pi_1", "metadata": {
                "user_id": "6f1c1a8e-3f57-4a4c-9a3e-1b2c3d4e5f60",
                "credits": "-5"
            }}}
        });
        assert!(matches!(
            webhook_action(&event),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn subscription_events_are_mirrored() {
        let event = json!({
            "type": "customer.subscription.updated",
            "data": { "object": {
                "id": "sub_1",
                "customer": "cus_1",
                "status": "active",
                "cancel_at_period_end": true,
                "items": { "data": [{
                    "price": { "id": "price_pro" },
                    "current_period_end": 1767225600
                }]}
            }}
        });
        assert_eq!(
            webhook_action(&event).unwrap(),
            WebhookAction::SyncSubscription(SubscriptionUpsertRequest {
                id: "sub_1".to_string(),
                customer_id: "cus_1".to_string(),
                price_id: "price_pro".to_string(),
                status: "active".to_string(),
                current_period_end: 1767225600,
                cancel_at_period_end: true,
            })
        );
    }

    #[test]
    fn unknown_events_are_ignored() {
        let event = json!({ "type": "invoice.created", "data": { "object": { "id": "in_1" } } });
        assert_eq!(webhook_action(&event).unwrap(), WebhookAction::Ignore);
    }

    #[test]
    fn bad_signature_is_rejected() {
        let err = verify_signature("{}", "t=1,v1=deadbeef", "whsec_test").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
