//! API request and response types.
//!
//! Request fields are all optional so that missing fields reach the
//! handlers and get a specific message instead of a deserializer error.

use crate::directory::User;
use crate::error::ApiError;
use axum::extract::FromRequest;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JSON body extractor that reports rejections as `{message}`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Request for a sign-up code.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest {
    pub mobile_no: Option<String>,
}

/// Response after requesting a sign-up code.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpResponse {
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl SendOtpResponse {
    /// A code was issued and is valid for `expires_in`.
    pub fn sent(expires_in: String) -> Self {
        Self {
            message: "OTP sent".to_string(),
            expires_in: Some(expires_in),
            status: None,
        }
    }

    /// Placeholder mode: nothing was issued.
    pub fn placeholder() -> Self {
        Self {
            message: "OTP verification is not enabled, continue with registration".to_string(),
            expires_in: None,
            status: Some("skipped".to_string()),
        }
    }
}

/// Request to check a sign-up code.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    pub mobile_no: Option<String>,
    pub otp: Option<String>,
}

/// Request to create an account.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Display name; the web client sends it as `fullName`
    #[serde(alias = "fullName")]
    pub username: Option<String>,
    pub email: Option<String>,
    pub mobile_no: Option<String>,
    pub password: Option<String>,
}

/// Request to log in.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub mobile_no: Option<String>,
    pub password: Option<String>,
}

/// Response after a successful login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: UserSummary,
}

/// Public view of a user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub mobile_no: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            mobile_no: user.mobile_no.clone(),
        }
    }
}

/// Response from the protected profile route.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub message: String,
    pub user_id: Uuid,
}

/// Contact-form submission.
#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

/// Response carrying a message and a status word.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub message: String,
    pub status: String,
}

/// Response carrying only a message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub users: usize,
    pub contacts: usize,
    pub pending_otps: usize,
    pub pending_contacts: usize,
}
