use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Upload {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_key: String,
    pub url: String,
    pub content_type: String,
    pub kind: String,
    pub size_bytes: i64,
    pub created_at: NaiveDateTime,
}
