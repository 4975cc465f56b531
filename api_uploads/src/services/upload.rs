use common::{
    error::{AppError, Res},
    misc::UploadKind,
};
use db::{dtos::upload::UploadCreateRequest, models::upload::Upload};
use sqlx::PgPool;
use uuid::Uuid;

use crate::services::storage::ObjectStorage;

const MAX_FILE_NAME_LENGTH: usize = 100;

/// Normalizes the `Content-Type` header to one of the accepted image types.
pub fn accepted_content_type(header: Option<&str>) -> Res<&'static str> {
    let mime = header
        .and_then(|value| value.split(';').next())
        .map(|value| value.trim().to_ascii_lowercase())
        .unwrap_or_default();

    match mime.as_str() {
        "image/jpeg" | "image/jpg" => Ok("image/jpeg"),
        "image/png" => Ok("image/png"),
        "image/webp" => Ok("image/webp"),
        "" => Err(AppError::BadRequest("Content-Type is required".to_string())),
        other => Err(AppError::BadRequest(format!(
            "Unsupported content type: {}. Expected image/jpeg, image/png or image/webp",
            other
        ))),
    }
}

/// Keeps ASCII letters, digits, `.`, `-` and `_`; everything else becomes `_`.
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.chars().take(MAX_FILE_NAME_LENGTH).collect()
    }
}

/// `{user_id}/{kind}/{uuid}-{file_name}`
pub fn object_key(user_id: Uuid, kind: UploadKind, file_name: &str) -> String {
    format!(
        "{}/{}/{}-{}",
        user_id,
        kind,
        Uuid::new_v4().simple(),
        sanitize_file_name(file_name)
    )
}

pub struct NewUpload<'a> {
    pub user_id: Uuid,
    pub file_name: &'a str,
    pub kind: UploadKind,
    pub content_type: &'static str,
    pub data: Vec<u8>,
}

/// Stores the bytes, then records the row. The object is removed again when
/// the insert fails.
pub async fn create_upload(
    pool: &PgPool,
    storage: &dyn ObjectStorage,
    upload: NewUpload<'_>,
) -> Res<Upload> {
    let key = object_key(upload.user_id, upload.kind, upload.file_name);
    let size_bytes = upload.data.len() as i64;
    let stored = storage.upload(&key, upload.content_type, upload.data).await?;

    let inserted = db::upload::insert_upload(
        pool,
        UploadCreateRequest {
            user_id: upload.user_id,
            file_key: stored.key.clone(),
            url: stored.url,
            content_type: upload.content_type.to_string(),
            kind: upload.kind,
            size_bytes,
        },
    )
    .await;

    if inserted.is_err() {
        if let Err(e) = storage.remove(&stored.key).await {
            log::error!("Failed to clean up orphaned object {}: {}", stored.key, e);
        }
    }
    inserted
}

pub async fn delete_upload(
    pool: &PgPool,
    storage: &dyn ObjectStorage,
    upload_id: Uuid,
    user_id: Uuid,
) -> Res<()> {
    let upload = db::upload::get_user_upload(pool, upload_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Upload not found".to_string()))?;

    storage.remove(&upload.file_key).await?;
    db::upload::delete_upload(pool, upload.id).await
}
