use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    dtos::billing::SubscriptionUpsertRequest,
    models::billing::{StripeCustomer, Subscription},
};

// === CUSTOMERS ===

pub async fn get_customer_by_user_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<Option<StripeCustomer>> {
    sqlx::query_as::<_, StripeCustomer>("SELECT * FROM stripe_customers WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_customer_by_customer_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    customer_id: &str,
) -> Res<Option<StripeCustomer>> {
    sqlx::query_as::<_, StripeCustomer>("SELECT * FROM stripe_customers WHERE customer_id = $1")
        .bind(customer_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

/// Stores the customer mapping. When a concurrent checkout already stored one,
/// the existing row wins and is returned.
pub async fn insert_customer<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
    customer_id: &str,
) -> Res<StripeCustomer> {
    sqlx::query_as::<_, StripeCustomer>(
        r#"
        INSERT INTO stripe_customers (user_id, customer_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(customer_id)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

// === SUBSCRIPTIONS ===

pub async fn upsert_subscription<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: SubscriptionUpsertRequest,
) -> Res<Subscription> {
    sqlx::query_as::<_, Subscription>(
        r#"
        INSERT INTO subscriptions (id, customer_id, price_id, status, current_period_end, cancel_at_period_end)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (id) DO UPDATE SET
            price_id = EXCLUDED.price_id,
            status = EXCLUDED.status,
            current_period_end = EXCLUDED.current_period_end,
            cancel_at_period_end = EXCLUDED.cancel_at_period_end,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(data.id)
    .bind(data.customer_id)
    .bind(data.price_id)
    .bind(data.status)
    .bind(data.current_period_end)
    .bind(data.cancel_at_period_end)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}
