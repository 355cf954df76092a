//! HTTP API for account sign-up and the contact form.

mod handlers;
mod middleware;
mod types;

pub use handlers::*;
pub use middleware::{
    logging_middleware, rate_limit_middleware, require_auth, AuthUser, RateLimitState,
};
pub use types::*;

use crate::auth::JwtService;
use crate::config::Config;
use crate::contact::PendingContact;
use crate::directory::{Directory, Store};
use crate::mail::Mailer;
use crate::otp::PendingOtp;
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use pending_store::PendingStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Registered users and verified contacts
    pub directory: Arc<RwLock<Directory>>,
    /// Persistent storage backend
    pub store: Arc<Store>,
    /// Issued OTPs keyed by normalized mobile number
    pub otps: PendingStore<String, PendingOtp>,
    /// Unverified contact submissions keyed by token
    pub pending_contacts: PendingStore<String, PendingContact>,
    pub mailer: Arc<dyn Mailer>,
    pub jwt: Arc<JwtService>,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: Config, directory: Directory, store: Store, mailer: Arc<dyn Mailer>) -> Self {
        let jwt = JwtService::new(
            &config.auth.jwt_secret,
            config.auth.issuer.clone(),
            config.auth.token_ttl,
        );

        Self {
            otps: PendingStore::new(config.otp.retention),
            pending_contacts: PendingStore::new(config.contact.token_ttl),
            directory: Arc::new(RwLock::new(directory)),
            store: Arc::new(store),
            mailer,
            jwt: Arc::new(jwt),
            config: Arc::new(config),
        }
    }

    /// Start background sweeps of both pending stores.
    pub fn spawn_sweepers(&self) -> Vec<JoinHandle<()>> {
        let interval = self.config.pending.sweep_interval;
        vec![
            self.otps.spawn_sweeper(interval),
            self.pending_contacts.spawn_sweeper(interval),
        ]
    }
}

/// Create the API router with the configured rate limit.
pub fn create_router(state: AppState) -> Router {
    let rate_limit = RateLimitState::new(state.config.rate_limit.global_per_minute);
    create_router_with_rate_limit(state, rate_limit)
}

/// Create the API router with custom rate limiting.
pub fn create_router_with_rate_limit(state: AppState, rate_limit: RateLimitState) -> Router {
    let cors = cors_layer(state.config.server.cors_origin.as_deref());

    let protected = Router::new()
        .route("/api/auth/profile", get(handlers::profile))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let api = Router::new()
        .route("/api/auth/send-otp", post(handlers::send_otp))
        .route("/api/auth/verify-otp", post(handlers::verify_otp))
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/contact", post(handlers::send_contact))
        .route("/api/contact/verify/:token", get(handlers::verify_contact))
        .merge(protected)
        .layer(axum_middleware::from_fn_with_state(
            rate_limit,
            rate_limit_middleware,
        ));

    Router::new()
        // Health check (no rate limiting)
        .route("/health", get(handlers::health))
        .merge(api)
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(3600));

    match origin {
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(value) => layer.allow_origin(value),
            Err(_) => {
                warn!(origin = %origin, "Invalid CORS origin, allowing any origin");
                layer.allow_origin(Any)
            }
        },
        None => layer.allow_origin(Any),
    }
}
