//! One-time codes asserting control of a mobile number before sign-up.

use crate::error::ApiError;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which sign-up flow the server runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpMode {
    /// Registration needs a verified code for the same mobile number
    #[default]
    Required,
    /// OTP endpoints answer without issuing codes; registration is ungated
    Placeholder,
}

/// A code issued for a mobile number, waiting to be verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOtp {
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub verified: bool,
}

impl PendingOtp {
    /// Issue a fresh random code valid for `code_ttl`.
    pub fn issue(code_ttl: Duration) -> Self {
        Self::new(generate_code(), Utc::now() + ttl_delta(code_ttl))
    }

    /// Create an unverified entry for a known code.
    pub fn new(code: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            code: code.into(),
            expires_at,
            verified: false,
        }
    }

    /// Whether the code can no longer be verified at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Check a submitted code, marking the entry verified on success.
    ///
    /// Expiry is checked before the code, so a stale entry reports
    /// `OtpExpired` even when the code matches.
    pub fn verify(&mut self, code: &str, now: DateTime<Utc>) -> Result<(), ApiError> {
        if self.is_expired(now) {
            return Err(ApiError::OtpExpired);
        }

        if self.code != code.trim() {
            return Err(ApiError::OtpInvalid);
        }

        self.verified = true;
        Ok(())
    }
}

/// Generate a random six-digit code.
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

/// Human-readable lifetime sent back with a new code.
pub fn describe_ttl(ttl: Duration) -> String {
    let minutes = ttl.as_secs() / 60;
    match minutes {
        0 => format!("{} seconds", ttl.as_secs()),
        1 => "1 minute".to_string(),
        n => format!("{} minutes", n),
    }
}

fn ttl_delta(ttl: Duration) -> chrono::Duration {
    chrono::Duration::seconds(ttl.as_secs() as i64)
}
