//! iKomyut API - account sign-up and contact-form backend.
//!
//! This service provides:
//! - Mobile-number sign-up gated by a one-time code
//! - Password login issuing bearer tokens
//! - A contact form whose messages are kept only after the sender
//!   confirms their email address
//! - Encrypted persistence of users and verified contacts

pub mod api;
pub mod auth;
pub mod config;
pub mod contact;
pub mod directory;
pub mod error;
pub mod mail;
pub mod otp;

pub use config::Config;
pub use directory::{Contact, Directory, Store, User};
pub use error::ApiError;
