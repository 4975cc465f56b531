use db::models::billing::Subscription;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AutoRenewRequest {
    pub subscription_id: String,
    pub auto_renew: bool,
}

/// `subscription` serializes as `null` when the user has no active plan.
#[derive(Debug, Serialize)]
pub struct SubscriptionStatusResponse {
    pub subscription: Option<Subscription>,
}
