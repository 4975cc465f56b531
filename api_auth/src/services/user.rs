use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, password_hash::PasswordHasher};
use chrono::{Duration, Utc};
use common::env_config::Config;
use common::error::{AppError, Res};
use db::dtos::auth::{AccountCreateRequest, VerificationCreateRequest};
use db::dtos::user::UserCreateRequest;
use db::models::{auth::AuthCredentials, user::User};
use sqlx::PgPool;
use uuid::Uuid;

use crate::dtos::auth::{OAuthUserData, RegisterRequest};
use crate::misc::oauth::OAuthProvider;

const VERIFICATION_TTL_HOURS: i64 = 24;

/// A concurrent registration can pass the existence check and lose on the
/// unique email constraint instead.
fn email_taken(error: AppError) -> AppError {
    match error {
        AppError::Database(sqlx::Error::Database(db_error)) if db_error.is_unique_violation() => {
            AppError::BadRequest("Email already registered".to_string())
        }
        other => other,
    }
}

pub async fn get_user_by_id(pool: &PgPool, user_id: Uuid) -> Res<User> {
    db::user::get_user_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Inserts user, credentials and a verification token in one transaction.
pub async fn create_user_with_credentials(
    pool: &PgPool,
    req: &RegisterRequest,
    config: &Config,
) -> Res<User> {
    let email = req.email.trim().to_lowercase();

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?
        .to_string();

    let mut tx = pool.begin().await?;

    let user = db::user::insert_user(
        &mut *tx,
        UserCreateRequest {
            email: email.clone(),
            name: req.name.trim().to_string(),
            image: None,
            email_verified: false,
        },
    )
    .await
    .map_err(email_taken)?;

    db::user::insert_user_credentials(
        &mut *tx,
        AuthCredentials {
            user_id: user.id,
            password_hash,
        },
    )
    .await?;

    let token = Uuid::new_v4().simple().to_string();
    db::auth::insert_verification(
        &mut *tx,
        VerificationCreateRequest {
            identifier: email,
            value: token.clone(),
            expires_at: (Utc::now() + Duration::hours(VERIFICATION_TTL_HOURS)).naive_utc(),
        },
    )
    .await?;

    tx.commit().await?;

    // delivery is handled outside this service
    log::debug!(
        "Verification link for {}: {}/verify?token={}",
        user.email,
        config.web_app_url.trim_end_matches('/'),
        token
    );
    Ok(user)
}

/// Consumes a verification token and marks the owning email as verified.
pub async fn verify_email(pool: &PgPool, token: &str) -> Res<User> {
    let mut tx = pool.begin().await?;

    let verification = db::auth::take_verification(&mut *tx, token)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid verification token".to_string()))?;

    if verification.expires_at < Utc::now().naive_utc() {
        // the row is gone either way
        tx.commit().await?;
        return Err(AppError::BadRequest(
            "Verification token has expired".to_string(),
        ));
    }

    let user = db::user::mark_email_verified(&mut *tx, &verification.identifier)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    tx.commit().await?;
    Ok(user)
}

/// Resolves the local user for an OAuth identity.
/// Known account: that user. Known email: link the account. Otherwise create both.
pub async fn find_or_create_oauth_user(
    pool: &PgPool,
    user_data: &OAuthUserData,
    provider: &OAuthProvider,
) -> Res<User> {
    if user_data.email.is_empty() || user_data.provider_user_id.is_empty() {
        return Err(AppError::BadRequest(format!(
            "{} did not return an email address",
            provider
        )));
    }

    let mut tx = pool.begin().await?;

    if let Some(account) =
        db::auth::get_account_by_provider(&mut *tx, provider.as_str(), &user_data.provider_user_id)
            .await?
    {
        let user = db::user::get_user_by_id(&mut *tx, account.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        tx.commit().await?;
        return Ok(user);
    }

    // linking or creating by email needs the provider to vouch for it
    if !user_data.email_verified {
        return Err(AppError::BadRequest(format!(
            "{} email address is not verified",
            provider
        )));
    }

    let email = user_data.email.trim().to_lowercase();
    let user = match db::user::get_user_by_email(&mut *tx, &email).await? {
        Some(user) => user,
        None => {
            db::user::insert_user(
                &mut *tx,
                UserCreateRequest {
                    email,
                    name: user_data.name.clone(),
                    image: user_data.image.clone(),
                    // the provider vouches for the address
                    email_verified: true,
                },
            )
            .await?
        }
    };

    db::auth::insert_account(
        &mut *tx,
        AccountCreateRequest {
            user_id: user.id,
            provider: provider.as_str().to_string(),
            provider_account_id: user_data.provider_user_id.clone(),
        },
    )
    .await?;

    tx.commit().await?;
    log::info!("Linked {} account to user {}", provider, user.id);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn password_user(pool: &PgPool, email: &str) -> User {
        db::user::insert_user(
            pool,
            UserCreateRequest {
                email: email.to_string(),
                name: "Ada".to_string(),
                image: None,
                email_verified: true,
            },
        )
        .await
        .unwrap()
    }

    fn github_identity(email: &str, email_verified: bool) -> OAuthUserData {
        OAuthUserData {
            email: email.to_string(),
            email_verified,
            name: "Someone".to_string(),
            image: None,
            provider_user_id: "gh-1234".to_string(),
        }
    }

    #[sqlx::test(migrations = "../db/migrations")]
    async fn registration_losing_the_email_race_is_bad_request(pool: PgPool) {
        password_user(&pool, "ada@example.com").await;

        let req = RegisterRequest {
            email: "Ada@Example.com".to_string(),
            password: "correct horse".to_string(),
            name: "Ada".to_string(),
        };
        let result = create_user_with_credentials(&pool, &req, &Config::default()).await;
        match result {
            Err(AppError::BadRequest(message)) => assert_eq!(message, "Email already registered"),
            other => panic!("expected bad request, got {:?}", other),
        }
    }

    #[sqlx::test(migrations = "../db/migrations")]
    async fn unverified_provider_email_is_not_linked(pool: PgPool) {
        let victim = password_user(&pool, "victim@example.com").await;

        let result = find_or_create_oauth_user(
            &pool,
            &github_identity("victim@example.com", false),
            &OAuthProvider::GitHub,
        )
        .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));

        let linked = db::auth::get_account_by_provider(&pool, "github", "gh-1234")
            .await
            .unwrap();
        assert!(linked.is_none());
        let user = db::user::get_user_by_id(&pool, victim.id).await.unwrap();
        assert!(user.is_some());
    }

    #[sqlx::test(migrations = "../db/migrations")]
    async fn verified_provider_email_links_existing_user(pool: PgPool) {
        let existing = password_user(&pool, "ada@example.com").await;

        let user = find_or_create_oauth_user(
            &pool,
            &github_identity("ADA@example.com", true),
            &OAuthProvider::GitHub,
        )
        .await
        .unwrap();
        assert_eq!(user.id, existing.id);

        // the second sign-in resolves through the linked account
        let again = find_or_create_oauth_user(
            &pool,
            &github_identity("ada@example.com", true),
            &OAuthProvider::GitHub,
        )
        .await
        .unwrap();
        assert_eq!(again.id, existing.id);
    }
}
