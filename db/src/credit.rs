use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    dtos::credit::CreditTransactionCreateRequest,
    models::credit::{CreditPackage, CreditTransaction},
};

// === PACKAGES ===

pub async fn get_active_packages<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
) -> Res<Vec<CreditPackage>> {
    sqlx::query_as::<_, CreditPackage>(
        "SELECT * FROM credit_packages WHERE active = TRUE ORDER BY sort_order, price_cents",
    )
    .fetch_all(executor)
    .await
    .map_err(AppError::from)
}

pub async fn get_active_package_by_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    package_id: Uuid,
) -> Res<Option<CreditPackage>> {
    sqlx::query_as::<_, CreditPackage>(
        "SELECT * FROM credit_packages WHERE id = $1 AND active = TRUE",
    )
    .bind(package_id)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

// === BALANCES ===

pub async fn get_balance<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<i64> {
    sqlx::query_scalar::<_, i64>("SELECT balance FROM credit_balances WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(executor)
        .await
        .map(|balance| balance.unwrap_or(0))
        .map_err(AppError::from)
}

/// Adds `amount` to the balance, creating the row on first use.
pub async fn increment_balance<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
    amount: i64,
) -> Res<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO credit_balances (user_id, balance)
        VALUES ($1, $2)
        ON CONFLICT (user_id)
        DO UPDATE SET balance = credit_balances.balance + EXCLUDED.balance, updated_at = NOW()
        RETURNING balance
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

/// Subtracts `amount` when the balance covers it.
/// Returns the new balance, or `None` when funds are short.
pub async fn decrement_balance<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
    amount: i64,
) -> Res<Option<i64>> {
    sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE credit_balances
        SET balance = balance - $2, updated_at = NOW()
        WHERE user_id = $1 AND balance >= $2
        RETURNING balance
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

// === TRANSACTIONS ===

/// Inserts the transaction unless one with the same reference exists.
/// Returns `None` for a duplicate reference.
pub async fn insert_transaction<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: CreditTransactionCreateRequest,
) -> Res<Option<CreditTransaction>> {
    sqlx::query_as::<_, CreditTransaction>(
        r#"
        INSERT INTO credit_transactions (user_id, amount, kind, reference, description)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (reference) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(data.user_id)
    .bind(data.amount)
    .bind(data.kind.to_string())
    .bind(data.reference)
    .bind(data.description)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

pub async fn get_transactions_by_user_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
    limit: i64,
) -> Res<Vec<CreditTransaction>> {
    sqlx::query_as::<_, CreditTransaction>(
        r#"
        SELECT * FROM credit_transactions
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(executor)
    .await
    .map_err(AppError::from)
}

/// The user's transaction carrying `reference`, if any.
pub async fn get_user_transaction_by_reference<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
    reference: &str,
) -> Res<Option<CreditTransaction>> {
    sqlx::query_as::<_, CreditTransaction>(
        "SELECT * FROM credit_transactions WHERE user_id = $1 AND reference = $2",
    )
    .bind(user_id)
    .bind(reference)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}
