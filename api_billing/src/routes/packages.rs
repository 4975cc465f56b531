use std::sync::Arc;

use actix_web::{Responder, get, web};
use common::{error::Res, http::Success};
use sqlx::PgPool;

use crate::dtos::checkout::PackagesResponse;

/// Lists the active credit packages, cheapest first within their display order.
///
/// # Frontend Example
/// ```javascript
/// const { packages } = await (await fetch('/api/packages')).json();
/// // [{ id, name, description, price_cents, credits, ... }]
/// ```
#[get("")]
pub async fn get_packages(pool: web::Data<Arc<PgPool>>) -> Res<impl Responder> {
    let pg_pool: &PgPool = &pool;
    let packages = db::credit::get_active_packages(pg_pool).await?;
    Success::ok(PackagesResponse { packages })
}
