use std::sync::Arc;

use actix_web::{HttpRequest, Responder, delete, get, post, web};
use common::{
    env_config::Config,
    error::{AppError, Res},
    http::Success,
    jwt::JwtClaims,
    misc::UploadKind,
};
use futures::StreamExt;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    dtos::upload::{DeleteUploadResponse, UploadQuery, UploadResponse, UploadsResponse},
    services::{
        self,
        storage::ObjectStorage,
        upload::{NewUpload, accepted_content_type},
    },
};

/// Reads the request body, refusing anything larger than `limit` bytes.
async fn read_body(mut payload: web::Payload, limit: usize) -> Res<Vec<u8>> {
    let mut body = Vec::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| AppError::BadRequest(format!("Failed to read body: {}", e)))?;
        if body.len() + chunk.len() > limit {
            return Err(AppError::BadRequest(format!(
                "File exceeds the {} byte limit",
                limit
            )));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Uploads an image to object storage.
///
/// # Input
/// - `file_name` (query): original file name, required
/// - `kind` (query): `source`, `target` or `result`, defaults to `source`
/// - body: the raw image bytes, sent with its `Content-Type` (jpeg, png or webp)
///
/// # Output
/// - Success: 201 Created with `{ success, upload: { id, file_key, url, ... } }`
/// - Error: 400 Bad Request for a missing name, unknown kind, empty or oversized
///   body, or unsupported content type
///
/// # Frontend Example
/// ```javascript
/// const file = input.files[0];
/// const response = await fetch(
///   `/api/secured/upload?file_name=${encodeURIComponent(file.name)}&kind=target`,
///   {
///     method: 'POST',
///     headers: {
///       'Content-Type': file.type,
///       'Authorization': `Bearer ${localStorage.getItem('authToken')}`
///     },
///     body: file
///   }
/// );
/// const { upload } = await response.json();
/// ```
#[post("")]
pub async fn post_upload(
    claims: web::ReqData<JwtClaims>,
    query: web::Query<UploadQuery>,
    req: HttpRequest,
    payload: web::Payload,
    pool: web::Data<Arc<PgPool>>,
    storage: web::Data<Arc<dyn ObjectStorage>>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let file_name = query
        .file_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::BadRequest("file_name is required".to_string()))?;
    let kind = match query.kind.as_deref() {
        Some(kind) => UploadKind::from_str(kind)?,
        None => UploadKind::default(),
    };
    let content_type = accepted_content_type(
        req.headers()
            .get("Content-Type")
            .and_then(|value| value.to_str().ok()),
    )?;

    let data = read_body(payload, config.upload_max_bytes).await?;
    if data.is_empty() {
        return Err(AppError::BadRequest("File is empty".to_string()));
    }

    let pg_pool: &PgPool = &pool;
    let upload = services::upload::create_upload(
        pg_pool,
        storage.get_ref().as_ref(),
        NewUpload {
            user_id: claims.user_id,
            file_name,
            kind,
            content_type,
            data,
        },
    )
    .await?;

    log::info!(
        "User {} uploaded {} ({} bytes)",
        claims.user_id,
        upload.file_key,
        upload.size_bytes
    );
    Success::created(UploadResponse { upload })
}

/// Lists the caller's uploads, newest first.
#[get("")]
pub async fn get_uploads(
    claims: web::ReqData<JwtClaims>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let pg_pool: &PgPool = &pool;
    let uploads = db::upload::get_uploads_by_user_id(pg_pool, claims.user_id).await?;
    Success::ok(UploadsResponse { uploads })
}

/// Removes an upload from storage and from the database.
/// Uploads owned by other users are reported as not found.
#[delete("/{id}")]
pub async fn delete_upload(
    claims: web::ReqData<JwtClaims>,
    path: web::Path<Uuid>,
    pool: web::Data<Arc<PgPool>>,
    storage: web::Data<Arc<dyn ObjectStorage>>,
) -> Res<impl Responder> {
    let upload_id = path.into_inner();
    let pg_pool: &PgPool = &pool;
    services::upload::delete_upload(
        pg_pool,
        storage.get_ref().as_ref(),
        upload_id,
        claims.user_id,
    )
    .await?;

    Success::ok(DeleteUploadResponse { id: upload_id })
}
