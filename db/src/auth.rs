use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    dtos::auth::{AccountCreateRequest, SessionCreateRequest, VerificationCreateRequest},
    models::auth::{Account, Session, Verification},
};

// === ACCOUNTS ===

pub async fn get_account_by_provider<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    provider: &str,
    provider_account_id: &str,
) -> Res<Option<Account>> {
    sqlx::query_as::<_, Account>(
        "SELECT * FROM accounts WHERE provider = $1 AND provider_account_id = $2",
    )
    .bind(provider)
    .bind(provider_account_id)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

pub async fn insert_account<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: AccountCreateRequest,
) -> Res<Account> {
    sqlx::query_as::<_, Account>(
        r#"
        INSERT INTO accounts (user_id, provider, provider_account_id)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(data.user_id)
    .bind(data.provider)
    .bind(data.provider_account_id)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

// === SESSIONS ===

pub async fn insert_session<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: SessionCreateRequest,
) -> Res<Session> {
    sqlx::query_as::<_, Session>(
        r#"
        INSERT INTO sessions (user_id, expires_at, ip_address, user_agent)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(data.user_id)
    .bind(data.expires_at)
    .bind(data.ip_address)
    .bind(data.user_agent)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

/// True when the session exists, belongs to the user and has not expired.
pub async fn is_session_active<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    session_id: Uuid,
    user_id: Uuid,
) -> Res<bool> {
    sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sessions
            WHERE id = $1 AND user_id = $2 AND expires_at > NOW() AT TIME ZONE 'UTC'
        )
        "#,
    )
    .bind(session_id)
    .bind(user_id)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn delete_session<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    session_id: Uuid,
) -> Res<()> {
    sqlx::query("DELETE FROM sessions WHERE id = $1")
        .bind(session_id)
        .execute(executor)
        .await?;
    Ok(())
}

// === VERIFICATIONS ===

pub async fn insert_verification<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: VerificationCreateRequest,
) -> Res<Verification> {
    sqlx::query_as::<_, Verification>(
        r#"
        INSERT INTO verifications (identifier, value, expires_at)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(data.identifier)
    .bind(data.value)
    .bind(data.expires_at)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

/// Removes the verification row and returns it, so a token can be consumed once.
pub async fn take_verification<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    value: &str,
) -> Res<Option<Verification>> {
    sqlx::query_as::<_, Verification>("DELETE FROM verifications WHERE value = $1 RETURNING *")
        .bind(value)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}
