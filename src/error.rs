use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::charts::UpstreamError;
use crate::database::StoreError;
use crate::utils::{PasswordError, TokenError};

pub const VALIDATION_MESSAGE: &str = "All fields are required";
pub const DUPLICATE_EMAIL_MESSAGE: &str = "Email is already registered";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials";
pub const MISSING_TOKEN_MESSAGE: &str = "Token is required";
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid token";
pub const EXPIRED_TOKEN_MESSAGE: &str = "Token expired";
pub const UPSTREAM_MESSAGE: &str = "Internal server error";
pub const INTERNAL_MESSAGE: &str = "Server error, please try again later";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("missing or malformed input")]
    Validation,
    #[error("email already registered")]
    DuplicateEmail,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("bearer token missing")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    Expired,
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation | AppError::MissingToken => StatusCode::BAD_REQUEST,
            AppError::DuplicateEmail => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken | AppError::Expired => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Upstream(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the caller. Never carries internal detail.
    pub fn public_message(&self) -> &'static str {
        match self {
            AppError::Validation => VALIDATION_MESSAGE,
            AppError::DuplicateEmail => DUPLICATE_EMAIL_MESSAGE,
            AppError::InvalidCredentials => INVALID_CREDENTIALS_MESSAGE,
            AppError::MissingToken => MISSING_TOKEN_MESSAGE,
            AppError::InvalidToken => INVALID_TOKEN_MESSAGE,
            AppError::Expired => EXPIRED_TOKEN_MESSAGE,
            AppError::Upstream(_) => UPSTREAM_MESSAGE,
            AppError::Internal(_) => INTERNAL_MESSAGE,
        }
    }

    fn is_token_error(&self) -> bool {
        matches!(
            self,
            AppError::MissingToken | AppError::InvalidToken | AppError::Expired
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = if self.is_token_error() {
            json!({ "isValid": false, "message": self.public_message() })
        } else {
            json!({ "message": self.public_message() })
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation => AppError::DuplicateEmail,
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AppError::Expired,
            TokenError::Invalid(_) => AppError::InvalidToken,
            other => AppError::Internal(other.to_string()),
        }
    }
}
