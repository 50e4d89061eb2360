use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::entities::subscription::{self, SubscriptionStatus, SubscriptionTier};
use crate::entities::Subscription;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Subscription term granted on signup and renewal.
const TERM_DAYS: i64 = 30;

#[derive(Clone)]
pub struct SubscriptionService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl SubscriptionService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    async fn find_active(
        &self,
        user_id: Uuid,
    ) -> Result<Option<subscription::Model>, ServiceError> {
        Ok(Subscription::find()
            .filter(subscription::Column::UserId.eq(user_id))
            .filter(subscription::Column::Status.eq(SubscriptionStatus::Active))
            .one(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn subscribe(
        &self,
        user_id: Uuid,
        tier: SubscriptionTier,
    ) -> Result<subscription::Model, ServiceError> {
        if self.find_active(user_id).await?.is_some() {
            return Err(ServiceError::Conflict(
                "You already have an active subscription.".to_string(),
            ));
        }

        let now = Utc::now();
        let model = subscription::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            tier: Set(tier),
            status: Set(SubscriptionStatus::Active),
            expires_at: Set(now + Duration::days(TERM_DAYS)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = model.insert(&*self.db).await?;
        self.event_sender
            .send(Event::SubscriptionCreated(created.id))
            .await;
        Ok(created)
    }

    /// The user's active subscription; `NotFound` when none exists.
    pub async fn status(&self, user_id: Uuid) -> Result<subscription::Model, ServiceError> {
        self.find_active(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("No active subscription found.".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn cancel(&self, user_id: Uuid) -> Result<subscription::Model, ServiceError> {
        let active = self.status(user_id).await?;

        let mut model: subscription::ActiveModel = active.into();
        model.status = Set(SubscriptionStatus::Inactive);
        model.updated_at = Set(Utc::now());
        let updated = model.update(&*self.db).await?;

        self.event_sender
            .send(Event::SubscriptionCancelled(updated.id))
            .await;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn change_tier(
        &self,
        user_id: Uuid,
        tier: SubscriptionTier,
    ) -> Result<subscription::Model, ServiceError> {
        let active = self.status(user_id).await?;

        let mut model: subscription::ActiveModel = active.into();
        model.tier = Set(tier);
        model.updated_at = Set(Utc::now());
        let updated = model.update(&*self.db).await?;

        self.event_sender
            .send(Event::SubscriptionUpdated(updated.id))
            .await;
        Ok(updated)
    }
}
