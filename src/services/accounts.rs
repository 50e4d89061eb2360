//! Account service: registration, credential login, password resets,
//! and the profile/reporting reads. Password hashing and token issuance
//! delegate to [`AuthService`].

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{validate_password_strength, AuthService, TokenResponse};
use crate::entities::subscription::{self, SubscriptionStatus, SubscriptionTier};
use crate::entities::user::{self, UserRole};
use crate::entities::{Subscription, User};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(length(min = 1))]
    pub state: String,
    #[validate(length(min = 1))]
    pub country: String,
    #[validate(range(min = 1))]
    pub age: i32,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterAdminRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
}

/// Account projection safe to return over the API: no password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountProfile {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub age: Option<i32>,
    pub subscription: Option<SubscriptionTier>,
    pub created_at: DateTime<Utc>,
}

impl AccountProfile {
    fn from_model(model: user::Model, subscription: Option<SubscriptionTier>) -> Self {
        Self {
            id: model.id,
            email: model.email,
            role: model.role,
            first_name: model.first_name,
            last_name: model.last_name,
            city: model.city,
            state: model.state,
            country: model.country,
            age: model.age,
            subscription,
            created_at: model.created_at,
        }
    }
}

#[derive(Clone)]
pub struct AccountService {
    db: Arc<DatabaseConnection>,
    auth: Arc<AuthService>,
    event_sender: Arc<EventSender>,
}

impl AccountService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        auth: Arc<AuthService>,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            db,
            auth,
            event_sender,
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, ServiceError> {
        Ok(User::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await?)
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register_user(
        &self,
        request: RegisterUserRequest,
    ) -> Result<AccountProfile, ServiceError> {
        request.validate()?;
        validate_password_strength(&request.password)?;

        if self.find_by_email(&request.email).await?.is_some() {
            return Err(ServiceError::Conflict("User already exists".to_string()));
        }

        let now = Utc::now();
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(request.email),
            password_hash: Set(self.auth.hash_password(&request.password)?),
            role: Set(UserRole::User),
            first_name: Set(Some(request.first_name)),
            last_name: Set(Some(request.last_name)),
            city: Set(Some(request.city)),
            state: Set(Some(request.state)),
            country: Set(Some(request.country)),
            age: Set(Some(request.age)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = model.insert(&*self.db).await?;
        info!(user_id = %created.id, "user registered");
        self.event_sender.send(Event::UserRegistered(created.id)).await;
        Ok(AccountProfile::from_model(created, None))
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register_admin(
        &self,
        request: RegisterAdminRequest,
    ) -> Result<AccountProfile, ServiceError> {
        request.validate()?;
        validate_password_strength(&request.password)?;

        if self.find_by_email(&request.email).await?.is_some() {
            return Err(ServiceError::Conflict("Admin already exists.".to_string()));
        }

        let now = Utc::now();
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(request.email),
            password_hash: Set(self.auth.hash_password(&request.password)?),
            role: Set(UserRole::Admin),
            first_name: Set(None),
            last_name: Set(None),
            city: Set(None),
            state: Set(None),
            country: Set(None),
            age: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = model.insert(&*self.db).await?;
        info!(admin_id = %created.id, "admin registered");
        self.event_sender.send(Event::AdminRegistered(created.id)).await;
        Ok(AccountProfile::from_model(created, None))
    }

    /// Verify credentials for an account holding `required_role` and
    /// issue a token. The same opaque error covers unknown accounts,
    /// wrong passwords, and role mismatches.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        required_role: UserRole,
    ) -> Result<TokenResponse, ServiceError> {
        let account = self
            .find_by_email(email)
            .await?
            .filter(|account| account.role == required_role)
            .ok_or_else(|| ServiceError::Unauthorized("Invalid credentials".to_string()))?;

        if !self.auth.verify_password(&account.password_hash, password)? {
            return Err(ServiceError::Unauthorized("Invalid credentials".to_string()));
        }

        info!(user_id = %account.id, "login succeeded");
        Ok(self.auth.issue_token(&account)?)
    }

    #[instrument(skip(self, new_password))]
    pub async fn reset_password(
        &self,
        email: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        validate_password_strength(new_password)?;

        let account = self
            .find_by_email(email)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found.".to_string()))?;

        let mut model: user::ActiveModel = account.into();
        model.password_hash = Set(self.auth.hash_password(new_password)?);
        model.updated_at = Set(Utc::now());
        model.update(&*self.db).await?;
        Ok(())
    }

    /// Admin-only direct reset: requires a matching confirmation and an
    /// existing admin account for the address.
    #[instrument(skip(self, password, confirm_password))]
    pub async fn admin_reset_password(
        &self,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<(), ServiceError> {
        if password != confirm_password {
            return Err(ServiceError::InvalidInput(
                "Passwords do not match.".to_string(),
            ));
        }
        validate_password_strength(password)?;

        let account = self
            .find_by_email(email)
            .await?
            .filter(|account| account.role == UserRole::Admin)
            .ok_or_else(|| ServiceError::NotFound("Admin not found.".to_string()))?;

        let mut model: user::ActiveModel = account.into();
        model.password_hash = Set(self.auth.hash_password(password)?);
        model.updated_at = Set(Utc::now());
        model.update(&*self.db).await?;
        Ok(())
    }

    /// The caller's own profile, including the active subscription tier.
    pub async fn profile(&self, user_id: Uuid) -> Result<AccountProfile, ServiceError> {
        let account = User::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        let tier = Subscription::find()
            .filter(subscription::Column::UserId.eq(user_id))
            .filter(subscription::Column::Status.eq(SubscriptionStatus::Active))
            .one(&*self.db)
            .await?
            .map(|s| s.tier);

        Ok(AccountProfile::from_model(account, tier))
    }

    /// Every account, password hashes stripped (admin reporting).
    pub async fn list_customers(&self) -> Result<Vec<AccountProfile>, ServiceError> {
        let accounts = User::find().all(&*self.db).await?;
        Ok(accounts
            .into_iter()
            .map(|a| AccountProfile::from_model(a, None))
            .collect())
    }
}
