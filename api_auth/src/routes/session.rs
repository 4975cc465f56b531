use actix_session::Session;
use actix_web::{Responder, get};
use common::error::{AppError, Res};
use common::http::Success;
use db::models::user::User;
use extractor::SESSION_TOKEN_KEY;

use crate::dtos::auth::AuthResponse;
use crate::routes::auth::SESSION_USER_KEY;

/// Retrieves the token and user stored in the cookie session.
///
/// # Output
/// - Success: `{ success, token, user }`
/// - Error: 401 Unauthorized if no session exists
///
/// # Frontend Example
/// ```javascript
/// // After the OAuth redirect lands on the web app
/// const response = await fetch('/api/auth/session', { credentials: 'include' });
/// if (response.status === 401) {
///   window.location.href = '/login';
/// }
/// ```
#[get("/session")]
pub async fn get_session(session: Session) -> Res<impl Responder> {
    let user = session
        .get::<User>(SESSION_USER_KEY)
        .map_err(|_| AppError::BadRequest("Session user error".to_string()))?
        .ok_or_else(|| AppError::Unauthorized("No user data found".to_string()))?;
    let token = session
        .get::<String>(SESSION_TOKEN_KEY)
        .map_err(|_| AppError::BadRequest("Session token error".to_string()))?
        .ok_or_else(|| AppError::Unauthorized("No session token found".to_string()))?;

    Success::ok(AuthResponse { token, user })
}
