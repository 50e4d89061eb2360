use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::common::client_key;
use crate::auth::TokenResponse;
use crate::entities::user::UserRole;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::accounts::{AccountProfile, RegisterAdminRequest, RegisterUserRequest};
use crate::ApiResponse;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({ "email": "buyer@example.com", "password": "S3cure!pass" }))]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(email)]
    pub email: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AdminResetPasswordRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Register a storefront user account
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "User registered", body = crate::ApiResponse<AccountProfile>),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(request): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AccountProfile>>), ServiceError> {
    let profile = state.services.accounts.register_user(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(profile))))
}

/// Log in as a storefront user
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login succeeded", body = crate::ApiResponse<TokenResponse>),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse),
        (status = 429, description = "Too many attempts", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn login_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ServiceError> {
    request.validate()?;

    let key = client_key(&headers);
    if !state.login_limiter.check(&key) {
        return Err(ServiceError::RateLimitExceeded);
    }

    let token = state
        .services
        .accounts
        .login(&request.email, &request.password, UserRole::User)
        .await?;

    state.login_limiter.reset(&key);
    Ok(Json(ApiResponse::success(token)))
}

/// Register an admin account
#[utoipa::path(
    post,
    path = "/api/v1/auth/register-admin",
    request_body = RegisterAdminRequest,
    responses(
        (status = 201, description = "Admin registered", body = crate::ApiResponse<AccountProfile>),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn register_admin(
    State(state): State<AppState>,
    Json(request): Json<RegisterAdminRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AccountProfile>>), ServiceError> {
    let profile = state.services.accounts.register_admin(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(profile))))
}

/// Log in as an admin
#[utoipa::path(
    post,
    path = "/api/v1/auth/login-admin",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login succeeded", body = crate::ApiResponse<TokenResponse>),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse),
        (status = 429, description = "Too many attempts", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn login_admin(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ServiceError> {
    request.validate()?;

    let key = client_key(&headers);
    if !state.login_limiter.check(&key) {
        return Err(ServiceError::RateLimitExceeded);
    }

    let token = state
        .services
        .accounts
        .login(&request.email, &request.password, UserRole::Admin)
        .await?;

    state.login_limiter.reset(&key);
    Ok(Json(ApiResponse::success(token)))
}

/// Reset a user password
#[utoipa::path(
    post,
    path = "/api/v1/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Weak password", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown account", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ServiceError> {
    request.validate()?;
    state
        .services
        .accounts
        .reset_password(&request.email, &request.new_password)
        .await?;
    Ok(Json(MessageResponse {
        message: "Password reset successfully.".to_string(),
    }))
}

/// Reset an admin password directly (requires confirmation field)
#[utoipa::path(
    post,
    path = "/api/v1/auth/admin-reset-password",
    request_body = AdminResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Mismatched or weak password", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown admin", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn admin_reset_password(
    State(state): State<AppState>,
    Json(request): Json<AdminResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ServiceError> {
    request.validate()?;
    state
        .services
        .accounts
        .admin_reset_password(&request.email, &request.password, &request.confirm_password)
        .await?;
    Ok(Json(MessageResponse {
        message: "Password reset successfully.".to_string(),
    }))
}

/// Authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register_user))
        .route("/login", post(login_user))
        .route("/register-admin", post(register_admin))
        .route("/login-admin", post(login_admin))
        .route("/reset-password", post(reset_password))
        .route("/admin-reset-password", post(admin_reset_password))
}
