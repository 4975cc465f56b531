use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{dtos::upload::UploadCreateRequest, models::upload::Upload};

pub async fn insert_upload<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: UploadCreateRequest,
) -> Res<Upload> {
    sqlx::query_as::<_, Upload>(
        r#"
        INSERT INTO uploads (user_id, file_key, url, content_type, kind, size_bytes)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(data.user_id)
    .bind(data.file_key)
    .bind(data.url)
    .bind(data.content_type)
    .bind(data.kind.as_str())
    .bind(data.size_bytes)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

/// Fetches an upload only when it is owned by the given user.
pub async fn get_user_upload<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    upload_id: Uuid,
    user_id: Uuid,
) -> Res<Option<Upload>> {
    sqlx::query_as::<_, Upload>("SELECT * FROM uploads WHERE id = $1 AND user_id = $2")
        .bind(upload_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_uploads_by_user_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<Vec<Upload>> {
    sqlx::query_as::<_, Upload>(
        "SELECT * FROM uploads WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
    .map_err(AppError::from)
}

pub async fn delete_upload<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    upload_id: Uuid,
) -> Res<()> {
    sqlx::query("DELETE FROM uploads WHERE id = $1")
        .bind(upload_id)
        .execute(executor)
        .await?;
    Ok(())
}
