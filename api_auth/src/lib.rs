use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{
    cookie::{Key, SameSite},
    web,
};
use middleware::auth::AuthMiddleware;

pub mod routes {
    pub mod auth;
    pub mod session;
    pub mod user;
}
pub mod middleware {
    pub mod auth;
}
mod services {
    pub(crate) mod auth;
    pub(crate) mod user;
}
pub mod dtos {
    pub mod auth;
}
mod misc {
    pub(crate) mod oauth;
}

pub use services::auth::validate_registration;

pub fn mount_auth() -> actix_web::Scope {
    web::scope("/auth")
        .service(routes::auth::post_register)
        .service(routes::auth::post_login)
        .service(routes::auth::post_logout)
        .service(routes::auth::get_verify)
        .service(routes::auth::get_auth_provider)
        .service(routes::auth::get_auth_provider_callback)
        .service(routes::session::get_session)
}
/// Registers `/me` on the enclosing (secured) scope.
pub fn configure_user(cfg: &mut web::ServiceConfig) {
    cfg.service(routes::user::get_me);
}

// Requests passing this guard carry `JwtClaims` as request data
pub fn auth_middleware() -> AuthMiddleware {
    AuthMiddleware::new()
}

/// Cookie signing key derived from the JWT secret. Secrets shorter than 32 bytes
/// fall back to a random key, which invalidates cookie sessions on restart.
pub fn session_key(secret: &str) -> Key {
    if secret.len() >= 32 {
        Key::derive_from(secret.as_bytes())
    } else {
        log::warn!("JWT_SECRET is shorter than 32 bytes, using a random cookie key");
        Key::generate()
    }
}

pub fn session_middleware(
    cookie_secure: bool,
    key: Key,
) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("faceswap_session".to_string())
        .cookie_secure(cookie_secure)
        .cookie_same_site(if cookie_secure {
            SameSite::None
        } else {
            SameSite::Lax
        })
        .cookie_http_only(true)
        .build()
}
