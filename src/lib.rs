//! BeatVault API Library
//!
//! Backend for a digital beat storefront: catalog, checkout with
//! webhook-driven fulfillment, entitlement-gated downloads, favorites,
//! and subscriptions.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod rate_limiter;
pub mod services;

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{Json, Response},
    routing::get,
    Router,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::services::ServeDir;
use utoipa::ToSchema;

use crate::auth::AuthService;
use crate::rate_limiter::LoginRateLimiter;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub auth: Arc<AuthService>,
    pub services: handlers::AppServices,
    pub login_limiter: Arc<LoginRateLimiter>,
}

// Common response wrapper
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// All v1 API routes.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .nest("/auth", handlers::auth::auth_routes())
        .nest("/beats", handlers::beats::beat_routes())
        .nest("/checkout", handlers::checkout::checkout_routes())
        .nest("/favorites", handlers::favorites::favorite_routes())
        .nest("/subscriptions", handlers::subscriptions::subscription_routes())
        .nest("/users", handlers::users::user_routes())
        .nest("/admin", handlers::admin::admin_routes())
}

/// The full application router: v1 API, uploaded-file serving, Swagger
/// UI, and the auth-service extension layer the extractors rely on.
/// Transport-level layers (CORS, tracing, compression) are added by the
/// binary on top.
pub fn app_router(state: AppState) -> Router {
    let auth_service = state.auth.clone();
    let upload_dir = state.config.upload_dir.clone();

    Router::new()
        .route("/", get(|| async { "beatvault-api up" }))
        .nest("/api/v1", api_v1_routes())
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .merge(openapi::swagger_ui())
        .layer(axum::middleware::from_fn_with_state(
            auth_service,
            inject_auth_service,
        ))
        .with_state(state)
}

async fn inject_auth_service(
    State(auth): State<Arc<AuthService>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(auth);
    next.run(request).await
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let status_data = json!({
        "status": "ok",
        "service": "beatvault-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": { "database": db_status },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}
