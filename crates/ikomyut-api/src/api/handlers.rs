//! HTTP request handlers.

use super::middleware::AuthUser;
use super::types::{
    ApiJson, ContactRequest, HealthResponse, LoginRequest, LoginResponse, MessageResponse,
    ProfileResponse, RegisterRequest, SendOtpRequest, SendOtpResponse, StatusResponse,
    UserSummary, VerifyOtpRequest,
};
use super::AppState;
use crate::auth::{hash_password, verify_password};
use crate::contact::{
    admin_notification, confirmation_page, generate_token, is_valid_email, verification_email,
    verification_link, PendingContact,
};
use crate::directory::{normalize_mobile_number, User};
use crate::error::ApiError;
use crate::otp::{describe_ttl, OtpMode, PendingOtp};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    Extension, Json,
};
use chrono::Utc;
use tracing::{debug, error, info, warn};

/// Shortest password accepted at registration.
const MIN_PASSWORD_LEN: usize = 6;

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let (users, contacts) = {
        let directory = state.directory.read().await;
        (directory.user_count(), directory.contact_count())
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        users,
        contacts,
        pending_otps: state.otps.len().await,
        pending_contacts: state.pending_contacts.len().await,
    })
}

/// Issue a sign-up code for an unregistered mobile number.
pub async fn send_otp(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SendOtpRequest>,
) -> Result<Json<SendOtpResponse>, ApiError> {
    let mobile_no = present(request.mobile_no)
        .ok_or_else(|| ApiError::validation("Mobile number is required"))?;
    let mobile_no = normalize_mobile_number(&mobile_no).map_err(ApiError::Validation)?;

    if state.directory.read().await.is_mobile_registered(&mobile_no) {
        warn!(mobile_no = %mobile_no, "OTP requested for registered number");
        return Err(ApiError::MobileAlreadyRegistered);
    }

    if state.config.otp.mode == OtpMode::Placeholder {
        debug!(mobile_no = %mobile_no, "OTP placeholder mode, no code issued");
        return Ok(Json(SendOtpResponse::placeholder()));
    }

    let code_ttl = state.config.otp.code_ttl;
    let otp = PendingOtp::issue(code_ttl);

    // No SMS gateway: the code is delivered through the server log.
    info!(mobile_no = %mobile_no, otp = %otp.code, "OTP issued");

    if state.otps.insert(mobile_no.clone(), otp).await.is_some() {
        debug!(mobile_no = %mobile_no, "Replaced earlier OTP");
    }

    Ok(Json(SendOtpResponse::sent(describe_ttl(code_ttl))))
}

/// Check a sign-up code.
pub async fn verify_otp(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VerifyOtpRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let (Some(mobile_no), Some(code)) = (present(request.mobile_no), present(request.otp)) else {
        return Err(ApiError::validation("Mobile number and OTP are required"));
    };
    let mobile_no = normalize_mobile_number(&mobile_no).map_err(ApiError::Validation)?;

    if state.config.otp.mode == OtpMode::Placeholder {
        return Ok(Json(MessageResponse::new("OTP verified")));
    }

    let now = Utc::now();
    let result = state
        .otps
        .update(&mobile_no, |pending| pending.verify(&code, now))
        .await
        .ok_or(ApiError::OtpNotRequested)?;

    if let Err(e) = result {
        warn!(mobile_no = %mobile_no, error = %e, "OTP verification failed");
        return Err(e);
    }

    info!(mobile_no = %mobile_no, "OTP verified");
    Ok(Json(MessageResponse::new("OTP verified")))
}

/// Create an account.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let (Some(username), Some(email), Some(mobile_no), Some(password)) = (
        present(request.username),
        present(request.email),
        present(request.mobile_no),
        request.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::validation("All fields are required"));
    };

    let mobile_no = normalize_mobile_number(&mobile_no).map_err(ApiError::Validation)?;

    if !is_valid_email(&email) {
        return Err(ApiError::InvalidEmail);
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    if state.config.otp.mode == OtpMode::Required {
        let verified = state
            .otps
            .get(&mobile_no)
            .await
            .is_some_and(|otp| otp.verified);
        if !verified {
            warn!(mobile_no = %mobile_no, "Registration without verified OTP");
            return Err(ApiError::OtpNotVerified);
        }
    }

    // Reject obvious conflicts before paying for the hash.
    state
        .directory
        .read()
        .await
        .check_available(&mobile_no, &email)?;

    let password_hash = hash_password(&password).await?;
    let user = User::new(username, email, mobile_no.clone(), password_hash);
    let user_id = user.id;

    {
        let mut directory = state.directory.write().await;
        directory.insert_user(user)?;

        if let Err(e) = state.store.save(&directory).await {
            directory.remove_user(&mobile_no);
            error!(mobile_no = %mobile_no, error = %e, "Failed to persist new user");
            return Err(e);
        }
    }

    state.otps.remove(&mobile_no).await;

    info!(mobile_no = %mobile_no, user_id = %user_id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully")),
    ))
}

/// Exchange mobile number and password for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (Some(mobile_no), Some(password)) = (
        present(request.mobile_no),
        request.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::validation("Mobile number and password are required"));
    };

    // A number that does not normalize cannot belong to anyone.
    let mobile_no =
        normalize_mobile_number(&mobile_no).map_err(|_| ApiError::InvalidCredentials)?;

    let user = state
        .directory
        .read()
        .await
        .find_user_by_mobile(&mobile_no)
        .cloned();

    let Some(user) = user else {
        warn!(mobile_no = %mobile_no, "Login for unknown number");
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password(&password, &user.password_hash).await? {
        warn!(mobile_no = %mobile_no, "Login with wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = state.jwt.create_token(user.id, &user.mobile_no)?;

    info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        user: UserSummary::from(&user),
    }))
}

/// Protected route returning the caller's identity.
pub async fn profile(Extension(user): Extension<AuthUser>) -> Json<ProfileResponse> {
    debug!(user_id = %user.user_id, mobile_no = %user.mobile_no, "Profile accessed");

    Json(ProfileResponse {
        message: "This is a protected route".to_string(),
        user_id: user.user_id,
    })
}

/// Accept a contact-form submission and email a verification link.
pub async fn send_contact(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ContactRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let (Some(name), Some(email), Some(message)) = (
        present(request.name),
        present(request.email),
        request.message.filter(|m| !m.trim().is_empty()),
    ) else {
        return Err(ApiError::validation("All fields are required"));
    };

    if !is_valid_email(&email) {
        return Err(ApiError::InvalidEmail);
    }

    let token = generate_token();
    let pending = PendingContact::new(name, email, message);
    let link = verification_link(&state.config.contact.base_url, &token);
    let outgoing = verification_email(&state.config.mail.from, &pending, &link);

    state.pending_contacts.insert(token, pending).await;

    info!(to = ?outgoing.to, "Contact submission awaiting verification");

    // The submission stays pending even if the email cannot be sent.
    if let Err(e) = state.mailer.send(&outgoing).await {
        error!(error = %e, "Failed to send verification email");
    }

    Ok(Json(StatusResponse {
        message: "Thank you! Check your email to verify your message.".to_string(),
        status: "ok".to_string(),
    }))
}

/// Follow a verification link: store the contact and notify the admin.
pub async fn verify_contact(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Html<String>, ApiError> {
    let Some((pending, expires_at)) = state.pending_contacts.remove_entry(&token).await else {
        warn!("Unknown or expired contact verification token");
        return Err(ApiError::InvalidVerificationLink);
    };

    let contact = pending.clone().into_contact();

    {
        let mut directory = state.directory.write().await;
        directory.insert_contact(contact.clone());

        if let Err(e) = state.store.save(&directory).await {
            directory.remove_contact(contact.id);
            drop(directory);

            error!(error = %e, "Failed to persist verified contact");
            state
                .pending_contacts
                .insert_until(token, pending, expires_at)
                .await;
            return Err(e);
        }
    }

    info!(contact_id = %contact.id, "Contact message verified");

    let notification = admin_notification(
        &state.config.mail.from,
        state.config.mail.admin_recipient(),
        &contact,
    );
    if let Err(e) = state.mailer.send(&notification).await {
        error!(error = %e, "Failed to send admin notification");
    }

    Ok(Html(confirmation_page(&state.config.contact.site_url)))
}

/// Trimmed value of a text field, or `None` when missing or blank.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
