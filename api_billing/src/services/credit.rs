use common::error::Res;
use common::misc::CreditTransactionKind;
use db::dtos::credit::CreditTransactionCreateRequest;
use sqlx::PgPool;

use crate::services::webhook::CreditGrant;

pub const DEFAULT_TRANSACTIONS_LIMIT: i64 = 25;
pub const MAX_TRANSACTIONS_LIMIT: i64 = 100;

/// Page size for the transaction history: 25 when absent, clamped to 1..=100.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_TRANSACTIONS_LIMIT)
        .clamp(1, MAX_TRANSACTIONS_LIMIT)
}

/// Applies a paid grant once per Stripe reference.
/// Returns the new balance, or `None` when the reference was already applied.
pub async fn grant_credits(pool: &PgPool, grant: &CreditGrant) -> Res<Option<i64>> {
    let mut tx = pool.begin().await?;

    let inserted = db::credit::insert_transaction(
        &mut *tx,
        CreditTransactionCreateRequest {
            user_id: grant.user_id,
            amount: grant.credits,
            kind: CreditTransactionKind::Purchase,
            reference: Some(grant.reference.clone()),
            description: Some(match grant.package_id {
                Some(package_id) => format!("Credit package {}", package_id),
                None => "Credit purchase".to_string(),
            }),
        },
    )
    .await?;

    if inserted.is_none() {
        tx.rollback().await?;
        return Ok(None);
    }

    let balance = db::credit::increment_balance(&mut *tx, grant.user_id, grant.credits).await?;
    tx.commit().await?;
    Ok(Some(balance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::dtos::user::UserCreateRequest;
    use uuid::Uuid;

    async fn seed_user(pool: &PgPool) -> Uuid {
        db::user::insert_user(
            pool,
            UserCreateRequest {
                email: "ada@example.com".to_string(),
                name: "Ada".to_string(),
                image: None,
                email_verified: true,
            },
        )
        .await
        .unwrap()
        .id
    }

    #[sqlx::test(migrations = "../db/migrations")]
    async fn replayed_grant_is_applied_once(pool: PgPool) {
        let user_id = seed_user(&pool).await;
        let grant = CreditGrant {
            user_id,
            package_id: None,
            credits: 10,
            reference: "cs_test_123".to_string(),
        };

        assert_eq!(grant_credits(&pool, &grant).await.unwrap(), Some(10));
        assert_eq!(grant_credits(&pool, &grant).await.unwrap(), None);
        assert_eq!(db::credit::get_balance(&pool, user_id).await.unwrap(), 10);

        let second = CreditGrant {
            reference: "pi_test_456".to_string(),
            credits: 5,
            ..grant
        };
        assert_eq!(grant_credits(&pool, &second).await.unwrap(), Some(15));

        let history = db::credit::get_transactions_by_user_id(&pool, user_id, 10)
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|tx| tx.kind == "purchase"));
    }

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(clamp_limit(None), 25);
        assert_eq!(clamp_limit(Some(10)), 10);
        assert_eq!(clamp_limit(Some(500)), 100);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(-3)), 1);
    }
}
