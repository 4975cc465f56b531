use actix_web::{HttpResponse, http::StatusCode};
use thiserror::Error;

pub type Res<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    // === CONVERSION ERRORS ===
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JWT error: {0}")]
    JWT(#[from] jsonwebtoken::errors::Error),

    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Stripe error: {0}")]
    Stripe(#[from] stripe::StripeError),

    // === APPLICATION ERRORS ===
    #[error("Authorization error: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Insufficient credits: {0}")]
    PaymentRequired(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),
}

const INTERNAL_MESSAGE: &str = "Internal server error";
const UPSTREAM_MESSAGE: &str = "Upstream service error";

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::JWT(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Reqwest(_) | AppError::Stripe(_) | AppError::Upstream(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PaymentRequired(_) => StatusCode::PAYMENT_REQUIRED,
        }
    }

    pub fn to_http_response(&self) -> HttpResponse {
        let message = match self {
            // === CONVERSION ERRORS ===
            AppError::Database(error) => {
                log::error!("Database error: {}", error);
                INTERNAL_MESSAGE.to_string()
            }
            AppError::JWT(error) => {
                log::error!("JWT error: {}", error);
                INTERNAL_MESSAGE.to_string()
            }
            AppError::Reqwest(error) => {
                log::error!("Reqwest error: {}", error);
                UPSTREAM_MESSAGE.to_string()
            }
            AppError::Stripe(error) => {
                log::error!("Stripe error: {}", error);
                UPSTREAM_MESSAGE.to_string()
            }
            AppError::Upstream(error) => {
                log::error!("Upstream error: {}", error);
                UPSTREAM_MESSAGE.to_string()
            }
            AppError::Internal(error) => {
                log::error!("Internal error: {}", error);
                INTERNAL_MESSAGE.to_string()
            }

            // === APPLICATION ERRORS ===
            _ => self.to_string(),
        };

        HttpResponse::build(self.status())
            .json(serde_json::json!({ "success": false, "error": message }))
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        self.to_http_response()
    }
}
