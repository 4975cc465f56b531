use chrono::NaiveDateTime;
use uuid::Uuid;

pub struct AccountCreateRequest {
    pub user_id: Uuid,
    pub provider: String,
    pub provider_account_id: String,
}

pub struct SessionCreateRequest {
    pub user_id: Uuid,
    pub expires_at: NaiveDateTime,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

pub struct VerificationCreateRequest {
    pub identifier: String,
    pub value: String,
    pub expires_at: NaiveDateTime,
}
