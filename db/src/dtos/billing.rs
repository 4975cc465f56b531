#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionUpsertRequest {
    pub id: String,
    pub customer_id: String,
    pub price_id: String,
    pub status: String,
    pub current_period_end: i64,
    pub cancel_at_period_end: bool,
}
