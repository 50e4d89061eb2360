use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{beat, favorite, Beat, Favorite};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// A favorite joined with the beat fields the storefront lists.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FavoriteBeat {
    pub favorite_id: Uuid,
    pub beat_id: Uuid,
    pub title: String,
    pub price: Decimal,
    pub favorited_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct FavoriteService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl FavoriteService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Add a beat to the user's favorites. The unique (user, beat) index
    /// makes the insert race-safe; a duplicate reports a conflict.
    #[instrument(skip(self))]
    pub async fn add_favorite(
        &self,
        user_id: Uuid,
        beat_id: Uuid,
    ) -> Result<favorite::Model, ServiceError> {
        Beat::find_by_id(beat_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Beat {} not found", beat_id)))?;

        let model = favorite::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            beat_id: Set(beat_id),
            created_at: Set(Utc::now()),
        };

        let inserted = Favorite::insert(model)
            .on_conflict(
                OnConflict::columns([favorite::Column::UserId, favorite::Column::BeatId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&*self.db)
            .await?;

        if inserted == 0 {
            return Err(ServiceError::Conflict(
                "Beat is already in your favorites".to_string(),
            ));
        }

        let stored = Favorite::find()
            .filter(favorite::Column::UserId.eq(user_id))
            .filter(favorite::Column::BeatId.eq(beat_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::InternalError("favorite missing after insert".into()))?;

        self.event_sender
            .send(Event::FavoriteAdded { user_id, beat_id })
            .await;
        Ok(stored)
    }

    /// The user's favorites, newest first, joined with beat title/price.
    pub async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<FavoriteBeat>, ServiceError> {
        let favorites = Favorite::find()
            .filter(favorite::Column::UserId.eq(user_id))
            .order_by_desc(favorite::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let beat_ids: Vec<Uuid> = favorites.iter().map(|f| f.beat_id).collect();
        let beats: HashMap<Uuid, beat::Model> = Beat::find()
            .filter(beat::Column::Id.is_in(beat_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect();

        Ok(favorites
            .into_iter()
            .filter_map(|f| {
                beats.get(&f.beat_id).map(|b| FavoriteBeat {
                    favorite_id: f.id,
                    beat_id: b.id,
                    title: b.title.clone(),
                    price: b.price,
                    favorited_at: f.created_at,
                })
            })
            .collect())
    }
}
