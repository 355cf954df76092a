//! Configuration for the API server.

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::otp::OtpMode;

/// Server configuration, read from `SECTION__KEY` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Directory storage configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Token signing configuration
    pub auth: AuthConfig,

    /// OTP flow configuration
    #[serde(default)]
    pub otp: OtpConfig,

    /// Contact form configuration
    #[serde(default)]
    pub contact: ContactConfig,

    /// Outgoing mail configuration
    #[serde(default)]
    pub mail: MailConfig,

    /// Pending-entry housekeeping
    #[serde(default)]
    pub pending: PendingConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origin (any origin when unset)
    #[serde(default)]
    pub cors_origin: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the encrypted directory file
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Enable persistence (if false, users and contacts are in-memory only)
    #[serde(default = "default_true")]
    pub persist: bool,

    /// Secret the encryption key is derived from
    #[serde(default)]
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for login tokens
    pub jwt_secret: String,

    /// Token issuer claim
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// Login token lifetime
    #[serde(default = "default_token_ttl", with = "humantime_serde")]
    pub token_ttl: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtpConfig {
    /// Whether registration requires a verified OTP
    #[serde(default)]
    pub mode: OtpMode,

    /// How long an issued code can be verified
    #[serde(default = "default_code_ttl", with = "humantime_serde")]
    pub code_ttl: Duration,

    /// How long a pending OTP entry is kept at all
    #[serde(default = "default_otp_retention", with = "humantime_serde")]
    pub retention: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactConfig {
    /// Public base URL of this API, used in verification links
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Website linked from the confirmation page
    #[serde(default = "default_site_url")]
    pub site_url: String,

    /// How long a verification link stays valid
    #[serde(default = "default_contact_token_ttl", with = "humantime_serde")]
    pub token_ttl: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// Mail relay URL (emails are only logged when unset)
    #[serde(default)]
    pub api_url: Option<String>,

    /// Mail relay API key
    #[serde(default)]
    pub api_key: Option<String>,

    /// Sender address
    #[serde(default = "default_mail_from")]
    pub from: String,

    /// Recipient of verified-contact notifications (defaults to `from`)
    #[serde(default)]
    pub admin_address: Option<String>,

    /// Relay request timeout
    #[serde(default = "default_mail_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PendingConfig {
    /// Interval between sweeps of expired OTPs and contact tokens
    #[serde(default = "default_sweep_interval", with = "humantime_serde")]
    pub sweep_interval: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Global requests per minute
    #[serde(default = "default_global_rpm")]
    pub global_per_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines
    #[serde(default)]
    pub json: bool,
}

// Default implementations
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
            cors_origin: None,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            persist: true,
            secret: None,
        }
    }
}

impl AuthConfig {
    /// Auth configuration with the given secret and default lifetimes.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            issuer: default_issuer(),
            token_ttl: default_token_ttl(),
        }
    }
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            mode: OtpMode::default(),
            code_ttl: default_code_ttl(),
            retention: default_otp_retention(),
        }
    }
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            site_url: default_site_url(),
            token_ttl: default_contact_token_ttl(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            from: default_mail_from(),
            admin_address: None,
            timeout: default_mail_timeout(),
        }
    }
}

impl MailConfig {
    /// Where verified-contact notifications are sent.
    pub fn admin_recipient(&self) -> &str {
        self.admin_address.as_deref().unwrap_or(&self.from)
    }
}

impl Default for PendingConfig {
    fn default() -> Self {
        Self {
            sweep_interval: default_sweep_interval(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            global_per_minute: default_global_rpm(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value functions
fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    5000
}

fn default_store_path() -> PathBuf {
    PathBuf::from("/data/directory.enc")
}

fn default_true() -> bool {
    true
}

fn default_issuer() -> String {
    "ikomyut-api".into()
}

fn default_token_ttl() -> Duration {
    Duration::from_secs(7 * 24 * 60 * 60)
}

fn default_code_ttl() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_otp_retention() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_base_url() -> String {
    "http://localhost:5000".into()
}

fn default_site_url() -> String {
    "http://localhost:3000".into()
}

fn default_contact_token_ttl() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

fn default_mail_from() -> String {
    "noreply@ikomyut.ph".into()
}

fn default_mail_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_global_rpm() -> u32 {
    60
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Configuration with the given auth section and defaults everywhere else.
    pub fn new(auth: AuthConfig) -> Self {
        Self {
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            auth,
            otp: OtpConfig::default(),
            contact: ContactConfig::default(),
            mail: MailConfig::default(),
            pending: PendingConfig::default(),
            rate_limit: RateLimitConfig::default(),
            log: LogConfig::default(),
        }
    }

    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject combinations that would make the API misreport state.
    pub fn validate(&self) -> Result<()> {
        // An OTP entry swept before its code expires would answer
        // "No OTP requested" where "OTP expired" is due.
        ensure!(
            self.otp.retention >= self.otp.code_ttl,
            "otp.retention ({:?}) must not be shorter than otp.code_ttl ({:?})",
            self.otp.retention,
            self.otp.code_ttl
        );
        Ok(())
    }
}
