use std::{env, sync::Arc};

#[derive(Clone, Debug)]
/// Configuration struct for the server.
///
/// This struct holds all the necessary configuration parameters
/// required to initialize and run the server.
/// It includes database connection details, JWT configuration,
/// server host and port, number of worker threads, CORS settings,
/// logging preferences, OAuth clients, Stripe keys, object storage
/// and the face-swap provider.
pub struct Config {
    // environment
    pub environment: String, // development or production
    /// The URL of the database to connect to.
    pub database_url: String,
    /// Configuration for JWT (JSON Web Token) authentication.
    pub jwt_config: JwtConfig,
    /// The hostname or IP address the server will bind to.
    pub server_host: String,
    /// The port number the server will listen on.
    pub server_port: u16,
    /// The number of worker threads to spawn for handling requests.
    pub num_workers: usize,
    /// The allowed origin for CORS (Cross-Origin Resource Sharing).
    pub cors_allowed_origin: String,
    /// A boolean indicating whether console logging is enabled.
    pub console_logging_enabled: bool,
    /// The URL that the web application will redirect to after authentication.
    pub web_app_auth_callback_url: String,
    /// Base URL of the web application, used for verification links.
    pub web_app_url: String,
    /// Configuration for the Google OAuth2 client.
    pub google_client: OAuthProviderClient,
    /// Configuration for the GitHub OAuth2 client.
    pub github_client: OAuthProviderClient,
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// Stripe webhook secret
    pub stripe_webhook_secret: String,
    /// Object storage bucket settings.
    pub storage: StorageConfig,
    /// Face-swap provider settings.
    pub face_swap: FaceSwapConfig,
    /// Largest accepted upload, in bytes.
    pub upload_max_bytes: usize,
}

#[derive(Clone, Debug, Default)]
/// `OAuthProviderClient` holds the configuration necessary for interacting with an OAuth 2.0 provider.
///
/// It contains the client ID and secret, as well as the authentication and token URLs required
/// for the OAuth 2.0 flow. The redirect URI is also stored for use after successful authentication.
pub struct OAuthProviderClient {
    /// The client ID for the OAuth 2.0 provider.
    pub client_id: String,
    /// The client secret for the OAuth 2.0 provider.
    pub client_secret: String,
    /// The authentication URL for the OAuth 2.0 provider.
    pub auth_url: String,
    /// The token URL for the OAuth 2.0 provider.
    pub token_url: String,
    /// The redirect URI for the OAuth 2.0 provider.
    pub redirect_uri: String,
}

impl OAuthProviderClient {
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

#[derive(Clone, Debug)]
/// Configuration for JSON Web Token (JWT) authentication.
///
/// This struct contains the secret key used to sign JWTs and
/// the expiration time in hours for issued tokens.
pub struct JwtConfig {
    /// The secret key used to sign and verify JWTs.
    pub secret: String,
    /// The expiration time for JWTs in hours.
    pub expiration_hours: i64,
}

#[derive(Clone, Debug, Default)]
/// Supabase-style object storage endpoint.
pub struct StorageConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Service role key sent as bearer token.
    pub service_key: String,
    /// Bucket holding user uploads.
    pub bucket: String,
}

impl StorageConfig {
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty() && !self.service_key.is_empty() && !self.bucket.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct FaceSwapConfig {
    pub api_url: String,
    pub api_key: String,
    /// Credits charged for one swap job.
    pub credits_per_swap: i64,
}

impl FaceSwapConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_url.is_empty() && !self.api_key.is_empty()
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        JwtConfig {
            secret: String::new(),
            expiration_hours: 24,
        }
    }
}

impl Default for FaceSwapConfig {
    fn default() -> Self {
        FaceSwapConfig {
            api_url: String::new(),
            api_key: String::new(),
            credits_per_swap: 1,
        }
    }
}

impl Default for Config {
    /// Development defaults. Secrets and external endpoints are left empty.
    fn default() -> Self {
        Config {
            environment: "development".to_string(),
            database_url: String::new(),
            jwt_config: JwtConfig::default(),
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            num_workers: 4,
            cors_allowed_origin: "http://localhost:3000".to_string(),
            console_logging_enabled: true,
            web_app_auth_callback_url: "http://localhost:3000/auth/callback".to_string(),
            web_app_url: "http://localhost:3000".to_string(),
            google_client: OAuthProviderClient {
                auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
                token_url: "https://www.googleapis.com/oauth2/v4/token".to_string(),
                redirect_uri: "http://localhost:8080/api/auth/oauth/google/callback".to_string(),
                ..Default::default()
            },
            github_client: OAuthProviderClient {
                auth_url: "https://github.com/login/oauth/authorize".to_string(),
                token_url: "https://github.com/login/oauth/access_token".to_string(),
                redirect_uri: "http://localhost:8080/api/auth/oauth/github/callback".to_string(),
                ..Default::default()
            },
            stripe_secret_key: String::new(),
            stripe_webhook_secret: String::new(),
            storage: StorageConfig {
                bucket: "uploads".to_string(),
                ..Default::default()
            },
            face_swap: FaceSwapConfig::default(),
            upload_max_bytes: 10 * 1024 * 1024,
        }
    }
}

impl JwtConfig {
    /// Creates a new `JwtConfig` instance from environment variables.
    ///
    /// Reads the JWT configuration from environment variables:
    /// - `JWT_SECRET`: Required. The secret key for JWT signing.
    /// - `JWT_EXPIRATION_HOURS`: Optional. Defaults to 24 hours if not provided.
    ///
    /// # Panics
    ///
    /// This function will panic if:
    /// - `JWT_SECRET` environment variable is not set
    /// - `JWT_EXPIRATION_HOURS` is set but cannot be parsed as a valid number
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        JwtConfig {
            secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .expect("JWT_EXPIRATION_HOURS must be a valid number"),
        }
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn oauth_client_from_env(prefix: &str, defaults: &OAuthProviderClient) -> OAuthProviderClient {
    OAuthProviderClient {
        client_id: env::var(format!("{}_CLIENT_ID", prefix)).unwrap_or_default(),
        client_secret: env::var(format!("{}_CLIENT_SECRET", prefix)).unwrap_or_default(),
        auth_url: var_or(&format!("{}_AUTH_URL", prefix), &defaults.auth_url),
        token_url: var_or(&format!("{}_TOKEN_URL", prefix), &defaults.token_url),
        redirect_uri: var_or(&format!("{}_REDIRECT_URI", prefix), &defaults.redirect_uri),
    }
}

/// Credits charged per swap. Unparseable values use the default, negative ones clamp to 0.
fn parse_swap_price(raw: Option<&str>, default: i64) -> i64 {
    match raw.and_then(|c| c.trim().parse::<i64>().ok()) {
        Some(price) if price < 0 => {
            log::warn!("FACESWAP_CREDITS_PER_SWAP is negative ({}), using 0", price);
            0
        }
        Some(price) => price,
        None => default,
    }
}

impl Config {
    /// Creates a new `Config` instance from environment variables.
    ///
    /// Loads all configuration values from environment variables, falling back
    /// to the development values of `Config::default()` for optional settings.
    ///
    /// # Environment Variables
    ///
    /// Required:
    /// - `ENVIRONMENT`: `development` or `production`
    /// - `DATABASE_URL`: Connection string for the database
    /// - `JWT_SECRET`: Secret key for JWT signing (via `JwtConfig::from_env()`)
    ///
    /// Optional (with defaults):
    /// - `IP`: Server host (default: "127.0.0.1")
    /// - `PORT`: Server port (default: 8080)
    /// - `WORKERS`: Number of worker threads (default: 4)
    /// - `CORS_ALLOWED_ORIGIN`: Allowed CORS origin (default: "http://localhost:3000")
    /// - `ENABLE_CONSOLE_LOGGING`: Whether to enable console logging (default: true)
    /// - `WEB_APP_URL`, `WEB_APP_AUTH_CALLBACK_URL`
    /// - `GOOGLE_*`, `GITHUB_*`: OAuth provider settings
    /// - `STRIPE_SECRET_KEY`, `STRIPE_WEBHOOK_SECRET`
    /// - `STORAGE_URL`, `STORAGE_SERVICE_KEY`, `STORAGE_BUCKET` (default: "uploads")
    /// - `FACESWAP_API_URL`, `FACESWAP_API_KEY`, `FACESWAP_CREDITS_PER_SWAP` (default: 1)
    /// - `UPLOAD_MAX_BYTES` (default: 10 MiB)
    ///
    /// # Panics
    ///
    /// This function will panic if required environment variables are missing.
    pub fn from_env() -> Arc<Self> {
        dotenvy::dotenv().ok();
        let defaults = Config::default();

        Arc::new(Config {
            environment: env::var("ENVIRONMENT").expect("ENVIRONMENT must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_config: JwtConfig::from_env(),
            server_host: var_or("IP", &defaults.server_host),
            server_port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.server_port),
            num_workers: env::var("WORKERS")
                .ok()
                .and_then(|w| w.parse().ok())
                .unwrap_or(defaults.num_workers),
            cors_allowed_origin: var_or("CORS_ALLOWED_ORIGIN", &defaults.cors_allowed_origin),
            console_logging_enabled: var_or("ENABLE_CONSOLE_LOGGING", "true").to_lowercase()
                == "true",
            web_app_auth_callback_url: var_or(
                "WEB_APP_AUTH_CALLBACK_URL",
                &defaults.web_app_auth_callback_url,
            ),
            web_app_url: var_or("WEB_APP_URL", &defaults.web_app_url),
            google_client: oauth_client_from_env("GOOGLE", &defaults.google_client),
            github_client: oauth_client_from_env("GITHUB", &defaults.github_client),
            stripe_secret_key: env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
            stripe_webhook_secret: env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
            storage: StorageConfig {
                url: env::var("STORAGE_URL").unwrap_or_default(),
                service_key: env::var("STORAGE_SERVICE_KEY").unwrap_or_default(),
                bucket: var_or("STORAGE_BUCKET", &defaults.storage.bucket),
            },
            face_swap: FaceSwapConfig {
                api_url: env::var("FACESWAP_API_URL").unwrap_or_default(),
                api_key: env::var("FACESWAP_API_KEY").unwrap_or_default(),
                credits_per_swap: parse_swap_price(
                    env::var("FACESWAP_CREDITS_PER_SWAP").ok().as_deref(),
                    defaults.face_swap.credits_per_swap,
                ),
            },
            upload_max_bytes: env::var("UPLOAD_MAX_BYTES")
                .ok()
                .and_then(|b| b.parse().ok())
                .unwrap_or(defaults.upload_max_bytes),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_price_never_goes_negative() {
        assert_eq!(parse_swap_price(Some("-5"), 1), 0);
        assert_eq!(parse_swap_price(Some(" 3 "), 1), 3);
        assert_eq!(parse_swap_price(Some("0"), 1), 0);
        assert_eq!(parse_swap_price(Some("free"), 1), 1);
        assert_eq!(parse_swap_price(None, 1), 1);
    }
}
