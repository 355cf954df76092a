//! User and contact directory with encrypted persistence.

mod encrypted;
mod memory;

pub use encrypted::{EncryptedStore, MemoryStore, Store};
pub use memory::Directory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,

    /// Display name given at registration
    pub username: String,

    pub email: String,

    /// Normalized mobile number (`09XXXXXXXXX`)
    pub mobile_no: String,

    /// Argon2id PHC string; the plain password is never stored
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user record.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        mobile_no: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            mobile_no: mobile_no.into(),
            password_hash: password_hash.into(),
            created_at: Utc::now(),
        }
    }
}

/// A contact-form message whose sender proved control of the email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl Contact {
    /// Create a contact for a submission whose email link was followed.
    pub fn verified(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            message: message.into(),
            is_verified: true,
            created_at: Utc::now(),
        }
    }
}

/// Normalize a Philippine mobile number to the local `09XXXXXXXXX` form.
///
/// Accepts spaces, dashes, dots and parentheses as separators and a
/// `+63`/`63` country prefix in place of the leading zero.
pub fn normalize_mobile_number(number: &str) -> Result<String, String> {
    let trimmed = number.trim();
    if trimmed.is_empty() {
        return Err("Mobile number is required".into());
    }

    let mut compact: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();

    if let Some(rest) = compact.strip_prefix("+63") {
        compact = format!("0{}", rest);
    } else if compact.len() == 12 && compact.starts_with("63") {
        compact = format!("0{}", &compact[2..]);
    }

    if compact.len() != 11
        || !compact.starts_with("09")
        || !compact.chars().all(|c| c.is_ascii_digit())
    {
        return Err("Mobile number must be 11 digits starting with 09".into());
    }

    Ok(compact)
}
