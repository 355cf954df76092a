//! Shared helpers for the API integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use ikomyut_api::{
    api::{create_router_with_rate_limit, AppState, RateLimitState},
    config::{AuthConfig, Config},
    directory::{Directory, Store},
    mail::Mailer,
};
use mail_client::{MailError, OutgoingEmail};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const MOBILE: &str = "09171234567";
pub const EMAIL: &str = "juan@example.com";
pub const PASSWORD: &str = "secret123";

/// Mailer double that keeps every email it is asked to send.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<OutgoingEmail>>>,
    fail: bool,
}

impl RecordingMailer {
    /// A mailer whose every send fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(email.clone());
        if self.fail {
            return Err(MailError::Api {
                status: 500,
                message: "relay down".into(),
            });
        }
        Ok(())
    }
}

pub fn test_config() -> Config {
    Config::new(AuthConfig::new("test-jwt-secret"))
}

/// Test harness: state handle, router and the recording mailer.
pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub mailer: RecordingMailer,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(test_config(), Store::memory(), RecordingMailer::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self::with(config, Store::memory(), RecordingMailer::default())
    }

    pub fn with(config: Config, store: Store, mailer: RecordingMailer) -> Self {
        Self::with_rate_limit(config, store, mailer, RateLimitState::permissive())
    }

    pub fn with_rate_limit(
        config: Config,
        store: Store,
        mailer: RecordingMailer,
        rate_limit: RateLimitState,
    ) -> Self {
        let state = AppState::new(config, Directory::new(), store, Arc::new(mailer.clone()));
        let router = create_router_with_rate_limit(state.clone(), rate_limit);
        Self {
            state,
            router,
            mailer,
        }
    }

    pub async fn post(&self, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send_json(request).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send_json(request).await
    }

    pub async fn get_text(&self, uri: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, body) = self.send(request).await;
        (status, String::from_utf8(body).unwrap())
    }

    pub async fn send_json(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let (status, body) = self.send(request).await;
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    /// Run send-otp and verify-otp for `mobile_no`, reading the code from state.
    pub async fn verify_mobile(&self, mobile_no: &str) {
        let (status, _) = self
            .post("/api/auth/send-otp", serde_json::json!({ "mobileNo": mobile_no }))
            .await;
        assert_eq!(status, StatusCode::OK);

        let code = self.state.otps.get(mobile_no).await.unwrap().code;

        let (status, _) = self
            .post(
                "/api/auth/verify-otp",
                serde_json::json!({ "mobileNo": mobile_no, "otp": code }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    /// Verify the number and register an account with it.
    pub async fn register_user(&self, mobile_no: &str, email: &str, password: &str) {
        self.verify_mobile(mobile_no).await;

        let (status, body) = self
            .post(
                "/api/auth/register",
                serde_json::json!({
                    "username": "Juan dela Cruz",
                    "email": email,
                    "mobileNo": mobile_no,
                    "password": password,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
    }
}
