use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};
use common::{
    env_config::Config,
    error::{AppError, Res},
    jwt::{self, ClaimsSpec},
};
use db::{dtos::auth::SessionCreateRequest, models::user::User};
use oauth2::basic::*;
use oauth2::*;
use sqlx::PgPool;

use crate::{
    dtos::auth::{AuthResponse, ClientInfo, LoginRequest, OAuthUserData, RegisterRequest},
    misc::oauth::OAuthProvider,
};

pub const MIN_PASSWORD_LENGTH: usize = 8;

type ConfiguredClient = Client<
    StandardErrorResponse<BasicErrorResponseType>,
    StandardTokenResponse<EmptyExtraTokenFields, BasicTokenType>,
    StandardTokenIntrospectionResponse<EmptyExtraTokenFields, BasicTokenType>,
    StandardRevocableToken,
    StandardErrorResponse<RevocationErrorResponseType>,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// Checks the shape of a registration payload before anything touches the database.
pub fn validate_registration(req: &RegisterRequest) -> Res<()> {
    let email = req.email.trim();
    let valid_email = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.ends_with('.'))
        .unwrap_or(false);
    if !valid_email {
        return Err(AppError::BadRequest("A valid email is required".to_string()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }
    Ok(())
}

/// Create OAuth client object for the given provider.
pub fn create_oauth_client(provider: &OAuthProvider, config: &Config) -> Res<ConfiguredClient> {
    let provider_client = match provider {
        OAuthProvider::Google => &config.google_client,
        OAuthProvider::GitHub => &config.github_client,
    };

    if !provider_client.is_configured() {
        return Err(AppError::BadRequest(format!(
            "OAuth provider {} is not configured",
            provider
        )));
    }

    let invalid_url = |e: oauth2::url::ParseError| AppError::Internal(format!("Invalid OAuth URL: {}", e));

    let client = BasicClient::new(ClientId::new(provider_client.client_id.clone()))
        .set_client_secret(ClientSecret::new(provider_client.client_secret.clone()))
        .set_auth_uri(AuthUrl::new(provider_client.auth_url.clone()).map_err(invalid_url)?)
        .set_token_uri(TokenUrl::new(provider_client.token_url.clone()).map_err(invalid_url)?)
        .set_redirect_uri(
            RedirectUrl::new(provider_client.redirect_uri.clone()).map_err(invalid_url)?,
        );

    Ok(client)
}

/// Authenticates existing user.
/// Unknown email, OAuth-only account and wrong password all return 401.
pub async fn authenticate_user(pool: &PgPool, login_data: &LoginRequest) -> Res<User> {
    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let (user, credentials) =
        db::user::get_user_with_password_hash(pool, &login_data.email.trim().to_lowercase())
            .await?
            .ok_or_else(invalid)?;

    let parsed_hash = PasswordHash::new(&credentials.password_hash)
        .map_err(|e| AppError::Internal(format!("Stored password hash is malformed: {}", e)))?;
    let is_valid = Argon2::default()
        .verify_password(login_data.password.as_bytes(), &parsed_hash)
        .is_ok();

    if is_valid { Ok(user) } else { Err(invalid()) }
}

/// Records a session row and issues the JWT pointing at it.
pub async fn start_session(
    pool: &PgPool,
    user: User,
    client: ClientInfo,
    config: &Config,
) -> Res<AuthResponse> {
    let expires_at = jwt::expiration_from_now(&config.jwt_config)?;
    let session = db::auth::insert_session(
        pool,
        SessionCreateRequest {
            user_id: user.id,
            expires_at: expires_at.naive_utc(),
            ip_address: client.ip_address,
            user_agent: client.user_agent,
        },
    )
    .await?;

    let token = jwt::generate_jwt(
        ClaimsSpec {
            user_id: user.id,
            session_id: session.id,
            email: user.email.clone(),
        },
        &config.jwt_config,
    )?;

    log::info!("Session {} started for user {}", session.id, user.id);
    Ok(AuthResponse { token, user })
}

/// Fetches user profile data from the provider's API.
pub async fn fetch_provider_user_data(
    provider: &OAuthProvider,
    access_token: &str,
) -> Res<OAuthUserData> {
    match provider {
        OAuthProvider::Google => fetch_google_user_data(access_token).await,
        OAuthProvider::GitHub => fetch_github_user_data(access_token).await,
    }
}

async fn fetch_github_user_data(access_token: &str) -> Res<OAuthUserData> {
    let client = reqwest::Client::new();
    let response = client
        .get("https://api.github.com/user")
        .header("Authorization", format!("Bearer {}", access_token))
        .header("User-Agent", "faceswap-api")
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("Failed to fetch GitHub user data: {}", e)))?;

    if !response.status().is_success() {
        return Err(AppError::Upstream(format!(
            "GitHub API returned error status: {}",
            response.status()
        )));
    }

    let github_user: serde_json::Value = response
        .json()
        .await
        .map_err(|e| AppError::Upstream(format!("Failed to parse GitHub user data: {}", e)))?;

    // /user does not say whether the public email is verified, the emails API does
    let emails_response = client
        .get("https://api.github.com/user/emails")
        .header("Authorization", format!("Bearer {}", access_token))
        .header("User-Agent", "faceswap-api")
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("Failed to fetch GitHub emails: {}", e)))?;

    let emails: Vec<serde_json::Value> = if emails_response.status().is_success() {
        emails_response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse GitHub emails: {}", e)))?
    } else {
        log::warn!(
            "Failed to fetch GitHub emails: {:?}",
            emails_response.status()
        );
        Vec::new()
    };

    Ok(github_user_data(&github_user, &emails))
}

/// Picks the primary verified address from `/user/emails`, falling back to the
/// public profile email, which only counts as verified when the list says so.
fn github_user_data(github_user: &serde_json::Value, emails: &[serde_json::Value]) -> OAuthUserData {
    let is_verified = |entry: &serde_json::Value| entry["verified"].as_bool().unwrap_or(false);

    let primary = emails
        .iter()
        .find(|entry| entry["primary"].as_bool().unwrap_or(false) && is_verified(entry))
        .and_then(|entry| entry["email"].as_str());

    let (email, email_verified) = match (primary, github_user["email"].as_str()) {
        (Some(email), _) => (email.to_string(), true),
        (None, Some(public)) => {
            let verified = emails.iter().any(|entry| {
                entry["email"]
                    .as_str()
                    .is_some_and(|listed| listed.eq_ignore_ascii_case(public))
                    && is_verified(entry)
            });
            (public.to_string(), verified)
        }
        (None, None) => (String::new(), false),
    };

    let name = github_user["name"]
        .as_str()
        .or_else(|| github_user["login"].as_str())
        .unwrap_or("")
        .to_string();

    OAuthUserData {
        email,
        email_verified,
        name,
        image: github_user["avatar_url"].as_str().map(str::to_string),
        provider_user_id: github_user["id"].to_string(),
    }
}

async fn fetch_google_user_data(access_token: &str) -> Res<OAuthUserData> {
    let response = reqwest::Client::new()
        .get("https://www.googleapis.com/oauth2/v3/userinfo")
        .header("Authorization", format!("Bearer {}", access_token))
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("Failed to fetch Google user data: {}", e)))?;

    if !response.status().is_success() {
        return Err(AppError::Upstream(format!(
            "Google API returned error status: {}",
            response.status()
        )));
    }

    let google_user: serde_json::Value = response
        .json()
        .await
        .map_err(|e| AppError::Upstream(format!("Failed to parse Google user data: {}", e)))?;

    Ok(google_user_data(&google_user))
}

fn google_user_data(google_user: &serde_json::Value) -> OAuthUserData {
    OAuthUserData {
        email: google_user["email"].as_str().unwrap_or("").to_string(),
        email_verified: google_user["email_verified"].as_bool().unwrap_or(false),
        name: google_user["name"].as_str().unwrap_or("").to_string(),
        image: google_user["picture"].as_str().map(str::to_string),
        provider_user_id: google_user["sub"].as_str().unwrap_or("").to_string(),
    }
}
