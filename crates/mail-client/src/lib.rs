//! Client for a JSON transactional-mail relay.

mod client;
mod error;
mod types;

pub use client::MailClient;
pub use error::MailError;
pub use types::*;
