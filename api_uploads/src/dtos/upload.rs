use db::models::upload::Upload;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub file_name: Option<String>,
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub upload: Upload,
}

#[derive(Debug, Serialize)]
pub struct UploadsResponse {
    pub uploads: Vec<Upload>,
}

#[derive(Debug, Serialize)]
pub struct DeleteUploadResponse {
    pub id: Uuid,
}
