use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SwapRequest {
    pub source_upload_id: Uuid,
    pub target_upload_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SwapResponse {
    pub job_id: String,
    pub status: String,
    pub balance: i64,
}

#[derive(Debug, Serialize)]
pub struct SwapStatusResponse {
    pub job_id: String,
    pub status: String,
    pub result_url: Option<String>,
}
