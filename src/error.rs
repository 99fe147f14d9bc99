use axum::Json;
use axum::{
    extract::rejection::JsonRejection,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::cache::RateLimitDecision;
use crate::infrastructure::TokenError;

pub mod error_codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const DUPLICATE: &str = "DUPLICATE";
    pub const RATE_LIMITED: &str = "RATE_LIMITED";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("Too many requests")]
    RateLimited { retry_after: i64, reset_at: i64 },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn rate_limited(decision: &RateLimitDecision, now: DateTime<Utc>) -> Self {
        AppError::RateLimited {
            retry_after: decision.retry_after_secs(now),
            reset_at: decision.reset_epoch_secs(),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        AppError::Internal(e.to_string())
    }
}

// 请求体不是合法 JSON 时同样返回结构化错误
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(e: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("password hashing failed: {}", e))
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RateLimitResponse {
    error: &'static str,
    message: &'static str,
    retry_after: i64,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error) = match self {
            AppError::RateLimited {
                retry_after,
                reset_at,
            } => return rate_limit_response(retry_after, reset_at),
            AppError::Validation(message) => {
                (StatusCode::BAD_REQUEST, error_codes::VALIDATION_ERROR, message)
            }
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                error_codes::UNAUTHORIZED,
                "Unauthorized".to_string(),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                error_codes::UNAUTHORIZED,
                "Invalid credentials".to_string(),
            ),
            AppError::Forbidden(message) => {
                (StatusCode::FORBIDDEN, error_codes::FORBIDDEN, message)
            }
            AppError::Duplicate(message) => (StatusCode::CONFLICT, error_codes::DUPLICATE, message),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_codes::INTERNAL_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Internal(message) => {
                tracing::error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_codes::INTERNAL_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error, code })).into_response()
    }
}

fn rate_limit_response(retry_after: i64, reset_at: i64) -> Response {
    let body = Json(RateLimitResponse {
        error: "Too many requests",
        message: "You have exceeded the rate limit. Please try again later.",
        retry_after,
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
    let headers = response.headers_mut();
    headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
    headers.insert("x-ratelimit-reset", HeaderValue::from(reset_at));
    response
}
