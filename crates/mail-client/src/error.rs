//! Mail client errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Mail relay rejected the API key")]
    Unauthorized,

    #[error("Mail relay rate limit exceeded")]
    RateLimit,

    #[error("Mail relay error: {status} - {message}")]
    Api { status: u16, message: String },
}
