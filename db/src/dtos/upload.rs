use common::misc::UploadKind;
use uuid::Uuid;

pub struct UploadCreateRequest {
    pub user_id: Uuid,
    pub file_key: String,
    pub url: String,
    pub content_type: String,
    pub kind: UploadKind,
    pub size_bytes: i64,
}
