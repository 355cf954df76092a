//! Error types for the API server.
//!
//! The `Display` text of each variant is the message returned to the client.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Mobile number already registered")]
    MobileAlreadyRegistered,

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("No OTP requested for this number")]
    OtpNotRequested,

    #[error("OTP expired")]
    OtpExpired,

    #[error("Invalid OTP")]
    OtpInvalid,

    #[error("OTP not verified for this number")]
    OtpNotVerified,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Invalid or expired verification link")]
    InvalidVerificationLink,

    #[error("No token, authorization denied")]
    MissingToken,

    #[error("Token is not valid")]
    InvalidToken,

    #[error("Too many requests, please try again later")]
    RateLimitExceeded,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Validation failure with a user-facing message.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::MobileAlreadyRegistered
            | ApiError::EmailAlreadyRegistered
            | ApiError::OtpNotRequested
            | ApiError::OtpExpired
            | ApiError::OtpInvalid
            | ApiError::OtpNotVerified
            | ApiError::InvalidCredentials
            | ApiError::InvalidEmail
            | ApiError::InvalidVerificationLink => StatusCode::BAD_REQUEST,
            ApiError::MissingToken | ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Storage(_) | ApiError::Encryption(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let body = ErrorResponse {
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        ApiError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Storage(format!("JSON serialization error: {}", e))
    }
}

impl From<aes_gcm::Error> for ApiError {
    fn from(_: aes_gcm::Error) -> Self {
        ApiError::Encryption("AES-GCM encryption/decryption failed".to_string())
    }
}

impl From<mail_client::MailError> for ApiError {
    fn from(e: mail_client::MailError) -> Self {
        ApiError::Internal(format!("Mail delivery failed: {}", e))
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("Background task failed: {}", e))
    }
}
