//! Contact-form submissions held until the sender follows the emailed link.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use mail_client::OutgoingEmail;
use rand::RngCore;
use regex::Regex;

use crate::directory::Contact;

lazy_static! {
    static ref EMAIL_PATTERN: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[a-zA-Z]{2,}$").expect("Invalid email regex");
}

/// Random bytes in a verification token (hex encoded to twice as many chars).
const TOKEN_BYTES: usize = 32;

/// Path prefix of the verification link.
pub const VERIFY_PATH: &str = "/api/contact/verify/";

/// A submission waiting for its verification link to be followed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingContact {
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl PendingContact {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    /// The contact record created once the link is followed.
    pub fn into_contact(self) -> Contact {
        Contact::verified(self.name, self.email, self.message)
    }
}

/// Syntactic email check shared by the contact form and registration.
pub fn is_valid_email(email: &str) -> bool {
    if !EMAIL_PATTERN.is_match(email) {
        return false;
    }

    if email.len() < 5 {
        return false;
    }

    if email.starts_with('.') || email.ends_with('.') || email.contains("..") {
        return false;
    }

    email.split('@').next().is_some_and(|local| !local.is_empty())
}

/// Generate an unguessable verification token.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Link the sender follows to confirm the submission.
pub fn verification_link(base_url: &str, token: &str) -> String {
    format!("{}{}{}", base_url.trim_end_matches('/'), VERIFY_PATH, token)
}

/// Email asking the sender to confirm their submission.
pub fn verification_email(from: &str, pending: &PendingContact, link: &str) -> OutgoingEmail {
    let html = format!(
        r#"<h2>Thank You for Contacting Us</h2>
<p>Hi {name},</p>
<p>We received your message. Please verify your email by clicking the button below:</p>
<p><a href="{link}" style="background-color: #009432; color: white; padding: 12px 24px; text-decoration: none; border-radius: 5px; display: inline-block; margin: 20px 0;">Verify Email</a></p>
<p>Or copy and paste this link:<br><a href="{link}">{link}</a></p>
<p><strong>Your Message:</strong><br>{message}</p>
<p>Best regards,<br>The iKomyut Team</p>"#,
        name = escape_html(&pending.name),
        link = escape_html(link),
        message = html_paragraph(&pending.message),
    );

    OutgoingEmail::new(from, pending.email.as_str(), "Please verify your message", html)
}

/// Email telling the site owner about a verified message.
pub fn admin_notification(from: &str, to: &str, contact: &Contact) -> OutgoingEmail {
    let html = format!(
        r#"<h2>New Contact Message (Verified)</h2>
<p><strong>From:</strong> {name}</p>
<p><strong>Email:</strong> {email}</p>
<p><strong>Message:</strong></p>
<p>{message}</p>"#,
        name = escape_html(&contact.name),
        email = escape_html(&contact.email),
        message = html_paragraph(&contact.message),
    );

    OutgoingEmail::new(
        from,
        to,
        format!("New Verified Message from {}", contact.name),
        html,
    )
}

/// Page shown after a verification link is followed.
pub fn confirmation_page(site_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Email Verified</title>
    <style>
      body {{ font-family: Arial, sans-serif; display: flex; justify-content: center; align-items: center; height: 100vh; margin: 0; background: #f5f5f5; }}
      .container {{ text-align: center; background: white; padding: 40px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }}
      .success-icon {{ font-size: 60px; color: #009432; margin-bottom: 20px; }}
      h1 {{ color: #333; margin: 0 0 10px; }}
      p {{ color: #666; margin: 10px 0; }}
      a {{ color: #009432; text-decoration: none; font-weight: bold; }}
    </style>
  </head>
  <body>
    <div class="container">
      <div class="success-icon">&#10003;</div>
      <h1>Email Verified!</h1>
      <p>Thank you for verifying your email.</p>
      <p>Your message has been received and we will get back to you soon.</p>
      <p><a href="{site}">Return to website</a></p>
    </div>
  </body>
</html>"#,
        site = escape_html(site_url),
    )
}

/// Escape text for inclusion in HTML.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn html_paragraph(text: &str) -> String {
    escape_html(text).replace("\r\n", "<br>").replace('\n', "<br>")
}
