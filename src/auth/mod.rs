//! Authentication and authorization.
//!
//! Two roles exist: `user` (storefront customers) and `admin` (catalog
//! managers). Both authenticate with email + password and carry their
//! role inside an HS256 JWT; handlers take the [`AuthenticatedUser`] or
//! [`AdminUser`] extractor to gate access.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, SaltString},
    Argon2, PasswordHasher, PasswordVerifier,
};
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::user::{self, UserRole};

static HAS_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]").unwrap());
static HAS_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").unwrap());
static HAS_SPECIAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"[!@#$%^&*]").unwrap());

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// Authenticated principal extracted from the bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Token response returned by the login endpoints.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_issuer: String,
        jwt_audience: String,
        token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_issuer,
            jwt_audience,
            token_expiration,
        }
    }
}

/// Handles password hashing and token issuance/validation.
#[derive(Clone, Debug)]
pub struct AuthService {
    pub config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Hash a password with Argon2id and a fresh salt.
    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::HashError(e.to_string()))
    }

    /// Verify a candidate password against a stored hash.
    pub fn verify_password(&self, hash: &str, password: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Generate a JWT for an account.
    pub fn issue_token(&self, account: &user::Model) -> Result<TokenResponse, AuthError> {
        let now = Utc::now();
        let expires = now
            + ChronoDuration::from_std(self.config.token_expiration)
                .map_err(|_| AuthError::TokenCreation("invalid token duration".to_string()))?;

        let claims = Claims {
            sub: account.id.to_string(),
            email: account.email.clone(),
            role: match account.role {
                UserRole::Admin => "admin".to_string(),
                UserRole::User => "user".to_string(),
            },
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        Ok(TokenResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.token_expiration.as_secs() as i64,
        })
    }

    /// Validate a JWT and extract the claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.jwt_issuer]);
        validation.set_audience(&[&self.config.jwt_audience]);

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?;

        Ok(data.claims)
    }

    /// Resolve validated claims into an [`AuthUser`].
    pub fn auth_user_from_claims(&self, claims: &Claims) -> Result<AuthUser, AuthError> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        let role = match claims.role.as_str() {
            "admin" => UserRole::Admin,
            "user" => UserRole::User,
            _ => return Err(AuthError::InvalidToken),
        };
        Ok(AuthUser {
            user_id,
            email: claims.email.clone(),
            role,
        })
    }
}

/// Enforce the account password policy: at least 8 characters with one
/// letter, one digit, and one special character.
pub fn validate_password_strength(password: &str) -> Result<(), AuthError> {
    if password.len() < 8
        || !HAS_LETTER.is_match(password)
        || !HAS_DIGIT.is_match(password)
        || !HAS_SPECIAL.is_match(password)
    {
        return Err(AuthError::WeakPassword(
            "Password must be at least 8 characters long and contain at least one letter, \
             one number, and one special character."
                .to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Access denied. No token provided.")]
    MissingAuth,

    #[error("Invalid or expired token.")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Access denied. Admins only.")]
    AdminOnly,

    #[error("{0}")]
    WeakPassword(String),

    #[error("Hashing error: {0}")]
    HashError(String),

    #[error("Token creation error: {0}")]
    TokenCreation(String),

    #[error("Authentication service unavailable")]
    ServiceUnavailable,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AuthError::MissingAuth => (StatusCode::UNAUTHORIZED, "AUTH_MISSING_TOKEN"),
            AuthError::InvalidToken | AuthError::TokenExpired => {
                (StatusCode::FORBIDDEN, "AUTH_INVALID_TOKEN")
            }
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "AUTH_INVALID_CREDENTIALS"),
            AuthError::AdminOnly => (StatusCode::FORBIDDEN, "AUTH_ADMIN_ONLY"),
            AuthError::WeakPassword(_) => (StatusCode::BAD_REQUEST, "AUTH_WEAK_PASSWORD"),
            AuthError::HashError(_) | AuthError::TokenCreation(_) | AuthError::ServiceUnavailable => {
                (StatusCode::INTERNAL_SERVER_ERROR, "AUTH_INTERNAL_ERROR")
            }
        };

        let message = match &self {
            AuthError::HashError(_) | AuthError::TokenCreation(_) => {
                "Internal authentication error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(serde_json::json!({
            "error": { "code": code, "message": message }
        }));

        (status, body).into_response()
    }
}

impl From<AuthError> for crate::errors::ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::WeakPassword(msg) => crate::errors::ServiceError::ValidationError(msg),
            AuthError::InvalidCredentials => {
                crate::errors::ServiceError::Unauthorized("Invalid credentials".to_string())
            }
            AuthError::MissingAuth | AuthError::InvalidToken | AuthError::TokenExpired => {
                crate::errors::ServiceError::Unauthorized(err.to_string())
            }
            AuthError::AdminOnly => crate::errors::ServiceError::Forbidden(err.to_string()),
            other => crate::errors::ServiceError::InternalError(other.to_string()),
        }
    }
}

/// Bearer-token extractor. The [`AuthService`] is injected into request
/// extensions by a middleware layer at router construction.
pub type AuthenticatedUser = AuthUser;

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_service = parts
            .extensions
            .get::<Arc<AuthService>>()
            .ok_or(AuthError::ServiceUnavailable)?
            .clone();

        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MissingAuth)?;

        let token = header_value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or(AuthError::MissingAuth)?;

        let claims = auth_service.validate_token(token)?;
        auth_service.auth_user_from_claims(&claims)
    }
}

/// Extractor that additionally requires the `admin` role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AuthError::AdminOnly);
        }
        Ok(AdminUser(user))
    }
}
