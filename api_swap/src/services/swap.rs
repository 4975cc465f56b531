use common::{
    error::{AppError, Res},
    misc::CreditTransactionKind,
};
use db::dtos::credit::CreditTransactionCreateRequest;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::services::provider::{FaceSwapProvider, SwapJob};

pub struct SwapStarted {
    pub job: SwapJob,
    pub balance: i64,
}

pub fn validate_pair(source_upload_id: Uuid, target_upload_id: Uuid) -> Res<()> {
    if source_upload_id == target_upload_id {
        return Err(AppError::BadRequest(
            "source_upload_id and target_upload_id must differ".to_string(),
        ));
    }
    Ok(())
}

/// Debits the swap price, submits the job and records the usage, all in one
/// transaction. A failing provider call leaves the balance untouched.
pub async fn start_swap(
    pool: &PgPool,
    provider: &dyn FaceSwapProvider,
    user_id: Uuid,
    source_upload_id: Uuid,
    target_upload_id: Uuid,
    cost: i64,
) -> Res<SwapStarted> {
    validate_pair(source_upload_id, target_upload_id)?;

    let not_found = || AppError::NotFound("Upload not found".to_string());
    let source = db::upload::get_user_upload(pool, source_upload_id, user_id)
        .await?
        .ok_or_else(not_found)?;
    let target = db::upload::get_user_upload(pool, target_upload_id, user_id)
        .await?
        .ok_or_else(not_found)?;

    let mut tx = pool.begin().await?;

    let balance = if cost > 0 {
        db::credit::decrement_balance(&mut *tx, user_id, cost)
            .await?
            .ok_or_else(|| {
                AppError::PaymentRequired(format!("A face swap costs {} credits", cost))
            })?
    } else {
        db::credit::get_balance(&mut *tx, user_id).await?
    };

    let job = provider.create_swap(&source.url, &target.url).await?;

    let usage = CreditTransactionCreateRequest {
        user_id,
        amount: -cost,
        kind: CreditTransactionKind::Usage,
        reference: Some(job.job_id.clone()),
        description: Some(format!("Face swap {} onto {}", source.id, target.id)),
    };
    if let Err(e) = record_usage(tx, usage, &job.job_id).await {
        // the provider keeps working on a job nobody paid for
        log::error!(
            "Swap job {} accepted for user {} but not charged: {}",
            job.job_id,
            user_id,
            e
        );
        return Err(e);
    }

    Ok(SwapStarted { job, balance })
}

async fn record_usage(
    mut tx: Transaction<'_, Postgres>,
    usage: CreditTransactionCreateRequest,
    job_id: &str,
) -> Res<()> {
    db::credit::insert_transaction(&mut *tx, usage)
        .await?
        .ok_or_else(|| AppError::Upstream(format!("Duplicate swap job id {}", job_id)))?;
    tx.commit().await?;
    Ok(())
}

/// Provider status for a job the user paid for.
pub async fn get_swap(
    pool: &PgPool,
    provider: &dyn FaceSwapProvider,
    user_id: Uuid,
    job_id: &str,
) -> Res<SwapJob> {
    db::credit::get_user_transaction_by_reference(pool, user_id, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Swap job not found".to_string()))?;
    provider.get_swap(job_id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_uploads_are_rejected() {
        let id = Uuid::new_v4();
        assert!(matches!(validate_pair(id, id), Err(AppError::BadRequest(_))));
        assert!(validate_pair(id, Uuid::new_v4()).is_ok());
    }
}
