//! Integration tests for OTP sign-up, login and the protected route.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::{Duration, Utc};
use common::{test_config, TestApp, EMAIL, MOBILE, PASSWORD};
use ikomyut_api::otp::{OtpMode, PendingOtp};
use serde_json::json;

#[tokio::test]
async fn test_send_otp_issues_code() {
    let app = TestApp::new();

    let (status, json) = app
        .post("/api/auth/send-otp", json!({ "mobileNo": MOBILE }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "OTP sent");
    assert_eq!(json["expiresIn"], "5 minutes");

    let otp = app.state.otps.get(MOBILE).await.unwrap();
    assert_eq!(otp.code.len(), 6);
    assert!(!otp.verified);
}

#[tokio::test]
async fn test_send_otp_normalizes_number() {
    let app = TestApp::new();

    let (status, _) = app
        .post("/api/auth/send-otp", json!({ "mobileNo": "+63 917 123 4567" }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(app.state.otps.contains(MOBILE).await);
}

#[tokio::test]
async fn test_send_otp_requires_mobile() {
    let app = TestApp::new();

    let (status, json) = app.post("/api/auth/send-otp", json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Mobile number is required");
}

#[tokio::test]
async fn test_send_otp_rejects_bad_number() {
    let app = TestApp::new();

    let (status, json) = app
        .post("/api/auth/send-otp", json!({ "mobileNo": "12345" }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["message"],
        "Mobile number must be 11 digits starting with 09"
    );
    assert!(app.state.otps.is_empty().await);
}

#[tokio::test]
async fn test_resend_replaces_code() {
    let app = TestApp::new();

    app.post("/api/auth/send-otp", json!({ "mobileNo": MOBILE }))
        .await;
    app.state
        .otps
        .insert(MOBILE.to_string(), PendingOtp::new("000000", Utc::now()))
        .await;
    app.post("/api/auth/send-otp", json!({ "mobileNo": MOBILE }))
        .await;

    let otp = app.state.otps.get(MOBILE).await.unwrap();
    assert_ne!(otp.code, "000000");
    assert_eq!(app.state.otps.len().await, 1);
}

#[tokio::test]
async fn test_full_registration_flow() {
    let app = TestApp::new();

    app.register_user(MOBILE, EMAIL, PASSWORD).await;

    let directory = app.state.directory.read().await;
    let user = directory.find_user_by_mobile(MOBILE).unwrap();
    assert_eq!(user.email, EMAIL);
    assert_eq!(user.username, "Juan dela Cruz");
    assert_ne!(user.password_hash, PASSWORD);
    drop(directory);

    // The pending OTP is consumed
    assert!(!app.state.otps.contains(MOBILE).await);
}

#[tokio::test]
async fn test_register_accepts_full_name() {
    let app = TestApp::new();
    app.verify_mobile(MOBILE).await;

    let (status, json) = app
        .post(
            "/api/auth/register",
            json!({
                "fullName": "Maria Santos",
                "email": EMAIL,
                "mobileNo": MOBILE,
                "password": PASSWORD,
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["message"], "User registered successfully");

    let directory = app.state.directory.read().await;
    assert_eq!(
        directory.find_user_by_mobile(MOBILE).unwrap().username,
        "Maria Santos"
    );
}

#[tokio::test]
async fn test_duplicate_registration_rejected() {
    let app = TestApp::new();
    app.register_user(MOBILE, EMAIL, PASSWORD).await;

    let (status, json) = app
        .post("/api/auth/send-otp", json!({ "mobileNo": MOBILE }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Mobile number already registered");
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let app = TestApp::new();
    app.register_user(MOBILE, EMAIL, PASSWORD).await;

    app.verify_mobile("09998887777").await;
    let (status, json) = app
        .post(
            "/api/auth/register",
            json!({
                "username": "Other",
                "email": EMAIL,
                "mobileNo": "09998887777",
                "password": PASSWORD,
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Email already registered");
    assert_eq!(app.state.directory.read().await.user_count(), 1);
}

#[tokio::test]
async fn test_register_without_otp_rejected() {
    let app = TestApp::new();

    let (status, json) = app
        .post(
            "/api/auth/register",
            json!({
                "username": "Juan",
                "email": EMAIL,
                "mobileNo": MOBILE,
                "password": PASSWORD,
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "OTP not verified for this number");
    assert_eq!(app.state.directory.read().await.user_count(), 0);
}

#[tokio::test]
async fn test_register_with_unverified_otp_rejected() {
    let app = TestApp::new();
    app.post("/api/auth/send-otp", json!({ "mobileNo": MOBILE }))
        .await;

    let (status, json) = app
        .post(
            "/api/auth/register",
            json!({
                "username": "Juan",
                "email": EMAIL,
                "mobileNo": MOBILE,
                "password": PASSWORD,
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "OTP not verified for this number");
}

#[tokio::test]
async fn test_register_validation() {
    let app = TestApp::new();
    app.verify_mobile(MOBILE).await;

    let (status, json) = app
        .post(
            "/api/auth/register",
            json!({ "username": "Juan", "mobileNo": MOBILE, "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "All fields are required");

    let (status, json) = app
        .post(
            "/api/auth/register",
            json!({
                "username": "Juan",
                "email": "a..b@x.com",
                "mobileNo": MOBILE,
                "password": PASSWORD,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Please enter a valid email address");

    let (status, json) = app
        .post(
            "/api/auth/register",
            json!({
                "username": "Juan",
                "email": EMAIL,
                "mobileNo": MOBILE,
                "password": "12345",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Password must be at least 6 characters");

    assert_eq!(app.state.directory.read().await.user_count(), 0);
}

#[tokio::test]
async fn test_verify_otp_without_request() {
    let app = TestApp::new();

    let (status, json) = app
        .post(
            "/api/auth/verify-otp",
            json!({ "mobileNo": MOBILE, "otp": "123456" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "No OTP requested for this number");
}

#[tokio::test]
async fn test_verify_otp_requires_fields() {
    let app = TestApp::new();

    let (status, json) = app
        .post("/api/auth/verify-otp", json!({ "mobileNo": MOBILE }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Mobile number and OTP are required");
}

#[tokio::test]
async fn test_wrong_otp_rejected() {
    let app = TestApp::new();
    app.state
        .otps
        .insert(
            MOBILE.to_string(),
            PendingOtp::new("123456", Utc::now() + Duration::minutes(5)),
        )
        .await;

    let (status, json) = app
        .post(
            "/api/auth/verify-otp",
            json!({ "mobileNo": MOBILE, "otp": "654321" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Invalid OTP");
    assert!(!app.state.otps.get(MOBILE).await.unwrap().verified);
}

#[tokio::test]
async fn test_expired_otp_rejected_with_correct_code() {
    let app = TestApp::new();
    app.state
        .otps
        .insert(
            MOBILE.to_string(),
            PendingOtp::new("123456", Utc::now() - Duration::minutes(1)),
        )
        .await;

    let (status, json) = app
        .post(
            "/api/auth/verify-otp",
            json!({ "mobileNo": MOBILE, "otp": "123456" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "OTP expired");
}

#[tokio::test]
async fn test_placeholder_mode() {
    let mut config = test_config();
    config.otp.mode = OtpMode::Placeholder;
    let app = TestApp::with_config(config);

    let (status, json) = app
        .post("/api/auth/send-otp", json!({ "mobileNo": MOBILE }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "skipped");
    assert!(app.state.otps.is_empty().await);

    let (status, json) = app
        .post(
            "/api/auth/verify-otp",
            json!({ "mobileNo": MOBILE, "otp": "anything" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "OTP verified");

    let (status, _) = app
        .post(
            "/api/auth/register",
            json!({
                "username": "Juan",
                "email": EMAIL,
                "mobileNo": MOBILE,
                "password": PASSWORD,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // Conflict checks still apply
    let (status, json) = app
        .post("/api/auth/send-otp", json!({ "mobileNo": MOBILE }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Mobile number already registered");
}

#[tokio::test]
async fn test_login_success() {
    let app = TestApp::new();
    app.register_user(MOBILE, EMAIL, PASSWORD).await;

    let (status, json) = app
        .post(
            "/api/auth/login",
            json!({ "mobileNo": MOBILE, "password": PASSWORD }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Login successful");
    assert!(json["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(json["user"]["mobileNo"], MOBILE);
    assert_eq!(json["user"]["username"], "Juan dela Cruz");
    assert!(json["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = TestApp::new();
    app.register_user(MOBILE, EMAIL, PASSWORD).await;

    let (status, json) = app
        .post(
            "/api/auth/login",
            json!({ "mobileNo": MOBILE, "password": "not-the-password" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_login_unknown_number() {
    let app = TestApp::new();

    let (status, json) = app
        .post(
            "/api/auth/login",
            json!({ "mobileNo": "09998887777", "password": PASSWORD }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_login_requires_fields() {
    let app = TestApp::new();

    let (status, json) = app
        .post("/api/auth/login", json!({ "mobileNo": MOBILE }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Mobile number and password are required");
}

#[tokio::test]
async fn test_profile_requires_token() {
    let app = TestApp::new();

    let (status, json) = app.get("/api/auth/profile").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "No token, authorization denied");
}

#[tokio::test]
async fn test_profile_rejects_bad_token() {
    let app = TestApp::new();

    let request = Request::builder()
        .uri("/api/auth/profile")
        .header(header::AUTHORIZATION, "Bearer not-a-token")
        .body(Body::empty())
        .unwrap();
    let (status, json) = app.send_json(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Token is not valid");
}

#[tokio::test]
async fn test_profile_with_login_token() {
    let app = TestApp::new();
    app.register_user(MOBILE, EMAIL, PASSWORD).await;

    let (_, login) = app
        .post(
            "/api/auth/login",
            json!({ "mobileNo": MOBILE, "password": PASSWORD }),
        )
        .await;
    let token = login["token"].as_str().unwrap();

    let request = Request::builder()
        .uri("/api/auth/profile")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, json) = app.send_json(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "This is a protected route");
    assert_eq!(json["userId"], login["user"]["id"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_registrations_for_one_number() {
    let app = TestApp::new();
    app.verify_mobile(MOBILE).await;

    let first = app.post(
        "/api/auth/register",
        json!({
            "username": "Juan",
            "email": "juan@example.com",
            "mobileNo": MOBILE,
            "password": PASSWORD,
        }),
    );
    let second = app.post(
        "/api/auth/register",
        json!({
            "username": "Pedro",
            "email": "pedro@example.com",
            "mobileNo": MOBILE,
            "password": PASSWORD,
        }),
    );
    let ((a, _), (b, _)) = tokio::join!(first, second);

    let mut statuses = [a, b];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::BAD_REQUEST]);
    assert_eq!(app.state.directory.read().await.user_count(), 1);
}
