//! Mail relay HTTP client.

use crate::error::MailError;
use crate::types::*;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Client for a transactional mail relay speaking JSON over HTTP.
///
/// The API key is held in a `SecretString` so it never shows up in
/// debug output.
#[derive(Clone)]
pub struct MailClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl MailClient {
    /// Create a new mail client.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, MailError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: SecretString::new(api_key.into()),
        })
    }

    /// Base URL of the relay.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Hand an email to the relay for delivery.
    #[instrument(skip(self, email), fields(subject = %email.subject))]
    pub async fn send(&self, email: &OutgoingEmail) -> Result<SendEmailResponse, MailError> {
        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(email)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %message, "Mail relay rejected email");

            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => MailError::Unauthorized,
                StatusCode::TOO_MANY_REQUESTS => MailError::RateLimit,
                _ => MailError::Api {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let body = response.text().await?;
        let accepted = if body.trim().is_empty() {
            SendEmailResponse { id: None }
        } else {
            serde_json::from_str(&body)?
        };

        debug!(id = ?accepted.id, recipients = email.to.len(), "Email accepted by relay");
        Ok(accepted)
    }
}
