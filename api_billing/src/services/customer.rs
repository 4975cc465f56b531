use common::error::{AppError, Res};
use sqlx::PgPool;
use uuid::Uuid;

pub(crate) fn parse_customer_id(customer_id: &str) -> Res<stripe::CustomerId> {
    customer_id.parse::<stripe::CustomerId>().map_err(|e| {
        AppError::Internal(format!(
            "Failed to parse customer id: {}. {}",
            customer_id, e
        ))
    })
}

/// Stripe customer id stored for the user, if any.
pub async fn find_customer_id(pool: &PgPool, user_id: Uuid) -> Res<Option<stripe::CustomerId>> {
    match db::billing::get_customer_by_user_id(pool, user_id).await? {
        Some(customer) => parse_customer_id(&customer.customer_id).map(Some),
        None => Ok(None),
    }
}

/// Returns the user's Stripe customer, creating it on first use.
pub async fn ensure_customer(
    pool: &PgPool,
    client: &stripe::Client,
    user_id: Uuid,
) -> Res<stripe::CustomerId> {
    if let Some(customer_id) = find_customer_id(pool, user_id).await? {
        return Ok(customer_id);
    }

    let user = db::user::get_user_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let customer = common::stripe::create_customer(client, &user.email, &user.name, user.id).await?;
    let stored = db::billing::insert_customer(pool, user.id, customer.id.as_str()).await?;

    if stored.customer_id != customer.id.as_str() {
        log::warn!(
            "Stripe customer {} for user {} lost a race to {}",
            customer.id,
            user.id,
            stored.customer_id
        );
    } else {
        log::info!("Created Stripe customer {} for user {}", customer.id, user.id);
    }

    parse_customer_id(&stored.customer_id)
}
