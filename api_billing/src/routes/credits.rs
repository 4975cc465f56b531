use std::sync::Arc;

use actix_web::{Responder, get, web};
use common::{error::Res, http::Success, jwt::JwtClaims};
use sqlx::PgPool;

use crate::dtos::credit::{BalanceResponse, TransactionsQuery, TransactionsResponse};
use crate::services;

/// Current credit balance, 0 for users who never bought credits.
#[get("/balance")]
pub async fn get_balance(
    claims: web::ReqData<JwtClaims>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let pg_pool: &PgPool = &pool;
    let balance = db::credit::get_balance(pg_pool, claims.user_id).await?;
    Success::ok(BalanceResponse { balance })
}

/// Credit history, newest first.
///
/// # Input
/// - `limit`: optional page size (default 25, max 100)
#[get("/transactions")]
pub async fn get_transactions(
    claims: web::ReqData<JwtClaims>,
    query: web::Query<TransactionsQuery>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let pg_pool: &PgPool = &pool;
    let limit = services::credit::clamp_limit(query.limit);
    let transactions =
        db::credit::get_transactions_by_user_id(pg_pool, claims.user_id, limit).await?;
    Success::ok(TransactionsResponse { transactions })
}
