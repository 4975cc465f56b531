use std::sync::Arc;

use actix_session::Session;
use actix_web::{
    HttpMessage, HttpRequest, HttpResponse, Responder, get, http::header::LOCATION, post, web,
};
use common::env_config::Config;
use common::error::{AppError, Res};
use common::http::Success;
use common::jwt::JwtClaims;
use extractor::SESSION_TOKEN_KEY;
use oauth2::{AuthorizationCode, CsrfToken, Scope, TokenResponse, reqwest};
use serde_json::json;
use sqlx::PgPool;

use crate::dtos::auth::{
    AuthResponse, ClientInfo, LoginRequest, OAuthCallbackQuery, RegisterRequest, UserResponse,
    VerifyQuery,
};
use crate::misc::oauth::OAuthProvider;
use crate::services;

pub(crate) const SESSION_USER_KEY: &str = "user";
const SESSION_OAUTH_STATE_KEY: &str = "oauth_state";

fn client_info(req: &HttpRequest) -> ClientInfo {
    ClientInfo {
        ip_address: req
            .connection_info()
            .realip_remote_addr()
            .map(str::to_string),
        user_agent: req
            .headers()
            .get("User-Agent")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
    }
}

fn store_in_session(session: &Session, auth: &AuthResponse) -> Res<()> {
    session
        .insert(SESSION_TOKEN_KEY, &auth.token)
        .map_err(|_| AppError::Internal("Failed to insert token cookie".to_string()))?;
    session
        .insert(SESSION_USER_KEY, &auth.user)
        .map_err(|_| AppError::Internal("Failed to insert user cookie".to_string()))?;
    session.renew();
    Ok(())
}

/// Registers a new user with email and password authentication.
///
/// # Input
/// - `req`: JSON payload with `email`, `password` (8+ characters) and `name`
///
/// # Output
/// - Success: 201 Created with `{ success, user }`
/// - Error: 400 Bad Request on malformed input or an already registered email
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/auth/register', {
///   method: 'POST',
///   headers: { 'Content-Type': 'application/json' },
///   body: JSON.stringify({
///     email: 'user@example.com',
///     password: 'securepassword',
///     name: 'Jane Doe'
///   })
/// });
/// ```
#[post("/register")]
pub async fn post_register(
    req: web::Json<RegisterRequest>,
    pool: web::Data<Arc<PgPool>>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    services::auth::validate_registration(&req)?;

    let pg_pool: &PgPool = &pool;
    let email = req.email.trim().to_lowercase();
    if db::user::exists_user_by_email(pg_pool, &email).await? {
        return Err(AppError::BadRequest("Email already registered".to_string()));
    }

    let user =
        services::user::create_user_with_credentials(pg_pool, &req.into_inner(), &config).await?;
    log::info!("Registered user {}", user.id);
    Success::created(UserResponse { user })
}

/// Authenticates a user with email and password.
///
/// # Output
/// - Success: `{ success, token, user }`; the token is also kept in the cookie session
/// - Error: 401 Unauthorized for invalid credentials
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/auth/login', {
///   method: 'POST',
///   credentials: 'include',
///   headers: { 'Content-Type': 'application/json' },
///   body: JSON.stringify({ email: 'user@example.com', password: 'securepassword' })
/// });
/// const { token, user } = await response.json();
/// ```
#[post("/login")]
pub async fn post_login(
    http_req: HttpRequest,
    login_data: web::Json<LoginRequest>,
    config: web::Data<Arc<Config>>,
    pool: web::Data<Arc<PgPool>>,
    session: Session,
) -> Res<impl Responder> {
    let pg_pool: &PgPool = &pool;
    let user = services::auth::authenticate_user(pg_pool, &login_data).await?;
    let auth =
        services::auth::start_session(pg_pool, user, client_info(&http_req), &config).await?;

    store_in_session(&session, &auth)?;
    Success::ok(auth)
}

/// Ends the current session. The session row is deleted and the cookie purged.
#[post("/logout")]
pub async fn post_logout(
    http_req: HttpRequest,
    pool: web::Data<Arc<PgPool>>,
    session: Session,
) -> Res<impl Responder> {
    let claims = http_req
        .extensions()
        .get::<Res<JwtClaims>>()
        .and_then(|claims| claims.as_ref().ok().cloned());
    session.purge();

    let claims = claims
        .ok_or_else(|| AppError::Unauthorized("No authorization token provided".to_string()))?;
    let pg_pool: &PgPool = &pool;
    db::auth::delete_session(pg_pool, claims.session_id).await?;

    log::info!("Session {} ended for user {}", claims.session_id, claims.user_id);
    Success::ok(json!({}))
}

/// Confirms an email address with the token issued at registration.
/// Unknown, already used and expired tokens are rejected with 400.
#[get("/verify")]
pub async fn get_verify(
    query: web::Query<VerifyQuery>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let token = query.token.trim();
    if token.is_empty() {
        return Err(AppError::BadRequest("token is required".to_string()));
    }
    let pg_pool: &PgPool = &pool;
    let user = services::user::verify_email(pg_pool, token).await?;
    Success::ok(UserResponse { user })
}

/// Initiates OAuth authentication flow with the specified provider.
///
/// # Input
/// - `path`: OAuth provider name (google, github)
///
/// # Output
/// - Success: 302 to the provider's authorization page
/// - Error: 400 Bad Request for unknown or unconfigured providers
///
/// # Frontend Example
/// ```javascript
/// // A plain link, not an API call
/// <a href="/api/auth/oauth/github">Continue with GitHub</a>
/// ```
#[get("oauth/{provider}")]
pub async fn get_auth_provider(
    path: web::Path<String>,
    config: web::Data<Arc<Config>>,
    session: Session,
) -> Res<impl Responder> {
    let provider = OAuthProvider::from_str(path.as_str())?;
    let client = services::auth::create_oauth_client(&provider, &config)?;

    let (auth_url, csrf_token) = client
        .authorize_url(CsrfToken::new_random)
        .add_scopes(
            provider
                .get_scopes()
                .into_iter()
                .map(|s| Scope::new(s.to_string())),
        )
        .url();

    session
        .insert(SESSION_OAUTH_STATE_KEY, csrf_token.secret())
        .map_err(|_| AppError::Internal("Failed to store OAuth state".to_string()))?;

    Ok(HttpResponse::Found()
        .append_header((LOCATION, auth_url.to_string()))
        .finish())
}

/// Handles OAuth callback after user authenticates with the provider.
///
/// # Note
/// This endpoint is not called from frontend code. It is the redirect URL
/// registered with the provider. On success the cookie session holds the
/// token and user, and the browser is sent to `web_app_auth_callback_url`.
#[get("oauth/{provider}/callback")]
pub async fn get_auth_provider_callback(
    http_req: HttpRequest,
    path: web::Path<String>,
    query: web::Query<OAuthCallbackQuery>,
    config: web::Data<Arc<Config>>,
    pool: web::Data<Arc<PgPool>>,
    session: Session,
) -> Res<impl Responder> {
    let provider = OAuthProvider::from_str(path.as_str())?;

    let expected_state = session
        .get::<String>(SESSION_OAUTH_STATE_KEY)
        .map_err(|_| AppError::BadRequest("Session state error".to_string()))?;
    session.remove(SESSION_OAUTH_STATE_KEY);
    match (&expected_state, &query.state) {
        (Some(expected), Some(received)) if expected == received => {}
        _ => return Err(AppError::BadRequest("OAuth state mismatch".to_string())),
    }

    let client = services::auth::create_oauth_client(&provider, &config)?;
    let pg_pool: &PgPool = &pool;

    let http_client = reqwest::ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

    let token = client
        .exchange_code(AuthorizationCode::new(query.code.clone()))
        .request_async(&http_client)
        .await
        .map_err(|e| AppError::Upstream(format!("Failed to exchange code. {}", e)))?;

    let access_token = token.access_token().secret();
    let user_data = services::auth::fetch_provider_user_data(&provider, access_token).await?;
    let user = services::user::find_or_create_oauth_user(pg_pool, &user_data, &provider).await?;

    let auth =
        services::auth::start_session(pg_pool, user, client_info(&http_req), &config).await?;
    store_in_session(&session, &auth)?;

    Ok(HttpResponse::Found()
        .append_header((LOCATION, config.web_app_auth_callback_url.as_str()))
        .finish())
}
