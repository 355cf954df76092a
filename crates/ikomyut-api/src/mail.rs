//! Outgoing mail transports.

use async_trait::async_trait;
use mail_client::{MailClient, MailError, OutgoingEmail};
use std::sync::Arc;
use tracing::info;

use crate::config::MailConfig;

/// Something that can deliver an email.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a single email.
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// Sends through an HTTP mail relay.
pub struct RelayMailer {
    client: MailClient,
}

impl RelayMailer {
    pub fn new(client: MailClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Mailer for RelayMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        self.client.send(email).await.map(|_| ())
    }
}

/// Logs emails instead of sending them. Used when no relay is configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        info!(
            to = ?email.to,
            subject = %email.subject,
            "Mail relay not configured, email logged only"
        );
        Ok(())
    }
}

/// Build the mailer described by the configuration.
pub fn from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    match &config.api_url {
        Some(url) => {
            let api_key = config.api_key.clone().unwrap_or_default();
            let client = MailClient::new(url.as_str(), api_key, config.timeout)?;
            info!(relay = %client.base_url(), "Sending mail through relay");
            Ok(Arc::new(RelayMailer::new(client)))
        }
        None => {
            info!("MAIL__API_URL not set, outgoing mail will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}
