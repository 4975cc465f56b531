use std::sync::Arc;

use actix_web::{Responder, get, post, web};
use common::{
    env_config::Config,
    error::{AppError, Res},
    http::Success,
    jwt::JwtClaims,
};
use sqlx::PgPool;

use crate::{
    dtos::swap::{SwapRequest, SwapResponse, SwapStatusResponse},
    services::{self, provider::FaceSwapProvider},
};

/// Starts a face swap between two of the caller's uploads.
///
/// # Input
/// - `req`: JSON payload with `source_upload_id` (the face) and `target_upload_id`
///
/// # Output
/// - Success: 201 Created with `{ success, job_id, status, balance }`
/// - Error: 400 when both ids are equal, 404 when an upload is not the caller's,
///   402 when the credit balance is too low
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/secured/swap', {
///   method: 'POST',
///   headers: {
///     'Content-Type': 'application/json',
///     'Authorization': `Bearer ${localStorage.getItem('authToken')}`
///   },
///   body: JSON.stringify({ source_upload_id: face.id, target_upload_id: scene.id })
/// });
/// if (response.status === 402) {
///   window.location.href = '/pricing';
/// }
/// ```
#[post("")]
pub async fn post_swap(
    claims: web::ReqData<JwtClaims>,
    req: web::Json<SwapRequest>,
    pool: web::Data<Arc<PgPool>>,
    provider: web::Data<Arc<dyn FaceSwapProvider>>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    services::swap::validate_pair(req.source_upload_id, req.target_upload_id)?;

    let pg_pool: &PgPool = &pool;
    let started = services::swap::start_swap(
        pg_pool,
        provider.get_ref().as_ref(),
        claims.user_id,
        req.source_upload_id,
        req.target_upload_id,
        config.face_swap.credits_per_swap,
    )
    .await?;

    log::info!(
        "User {} started swap job {}, balance {}",
        claims.user_id,
        started.job.job_id,
        started.balance
    );
    Success::created(SwapResponse {
        job_id: started.job.job_id,
        status: started.job.status,
        balance: started.balance,
    })
}

/// Polls the provider for a job started by the caller.
#[get("/{job_id}")]
pub async fn get_swap(
    claims: web::ReqData<JwtClaims>,
    path: web::Path<String>,
    pool: web::Data<Arc<PgPool>>,
    provider: web::Data<Arc<dyn FaceSwapProvider>>,
) -> Res<impl Responder> {
    let job_id = path.into_inner();
    if job_id.trim().is_empty() {
        return Err(AppError::BadRequest("job_id is required".to_string()));
    }

    let pg_pool: &PgPool = &pool;
    let job =
        services::swap::get_swap(pg_pool, provider.get_ref().as_ref(), claims.user_id, &job_id)
            .await?;

    Success::ok(SwapStatusResponse {
        job_id: job.job_id,
        status: job.status,
        result_url: job.result_url,
    })
}
