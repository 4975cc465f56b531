use db::models::credit::CreditPackage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct PackagesResponse {
    pub packages: Vec<CreditPackage>,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub package_id: Uuid,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Deserialize)]
pub struct PaymentIntentRequest {
    pub package_id: Uuid,
}

/// Stripe identifiers are echoed back verbatim.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaymentIntentResponse {
    pub payment_intent_id: String,
    pub client_secret: Option<String>,
}
