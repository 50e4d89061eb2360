//! Beat catalog service: listing and admin CRUD. The checkout pipeline
//! reads the catalog exclusively through [`CheckoutService::price`];
//! nothing here mutates pipeline state.
//!
//! [`CheckoutService::price`]: crate::services::checkout::CheckoutService::price

use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::{beat, Beat};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Clone)]
pub struct CreateBeatInput {
    pub title: String,
    pub artist: String,
    pub genre: String,
    pub price: Decimal,
    pub audio_file: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateBeatInput {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub genre: Option<String>,
    pub price: Option<Decimal>,
}

#[derive(Clone)]
pub struct BeatCatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl BeatCatalogService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    pub async fn list_beats(&self) -> Result<Vec<beat::Model>, ServiceError> {
        Ok(Beat::find()
            .order_by_desc(beat::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    pub async fn get_beat(&self, id: Uuid) -> Result<beat::Model, ServiceError> {
        Beat::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Beat {} not found", id)))
    }

    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_beat(&self, input: CreateBeatInput) -> Result<beat::Model, ServiceError> {
        if input.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "price must not be negative".to_string(),
            ));
        }

        let now = chrono::Utc::now();
        let model = beat::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(input.title),
            artist: Set(input.artist),
            genre: Set(input.genre),
            price: Set(input.price),
            audio_file: Set(input.audio_file),
            image: Set(input.image),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = model.insert(&*self.db).await?;
        info!(beat_id = %created.id, "beat created");
        self.event_sender.send(Event::BeatUploaded(created.id)).await;
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update_beat(
        &self,
        id: Uuid,
        input: UpdateBeatInput,
    ) -> Result<beat::Model, ServiceError> {
        let existing = self.get_beat(id).await?;

        let mut model: beat::ActiveModel = existing.into();
        if let Some(title) = input.title {
            model.title = Set(title);
        }
        if let Some(artist) = input.artist {
            model.artist = Set(artist);
        }
        if let Some(genre) = input.genre {
            model.genre = Set(genre);
        }
        if let Some(price) = input.price {
            if price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "price must not be negative".to_string(),
                ));
            }
            model.price = Set(price);
        }
        model.updated_at = Set(chrono::Utc::now());

        let updated = model.update(&*self.db).await?;
        self.event_sender.send(Event::BeatUpdated(updated.id)).await;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_beat(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_beat(id).await?;
        Beat::delete_by_id(existing.id).exec(&*self.db).await?;
        self.event_sender.send(Event::BeatDeleted(id)).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrator::Migrator;
    use rust_decimal_macros::dec;
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;
    use tokio::sync::mpsc;

    async fn setup() -> BeatCatalogService {
        let db = Database::connect(crate::db::sqlite_test_options()).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(crate::events::process_events(rx));
        BeatCatalogService::new(Arc::new(db), Arc::new(EventSender::new(tx)))
    }

    fn input(title: &str, price: Decimal) -> CreateBeatInput {
        CreateBeatInput {
            title: title.to_string(),
            artist: "Artist".to_string(),
            genre: "drill".to_string(),
            price,
            audio_file: "http://localhost/uploads/audio/x.mp3".to_string(),
            image: None,
        }
    }

    #[tokio::test]
    async fn create_and_fetch_roundtrip() {
        let svc = setup().await;
        let created = svc.create_beat(input("Night Drive", dec!(29.99))).await.unwrap();

        let fetched = svc.get_beat(created.id).await.unwrap();
        assert_eq!(fetched.title, "Night Drive");
        assert_eq!(fetched.price, dec!(29.99));
    }

    #[tokio::test]
    async fn get_unknown_beat_is_not_found() {
        let svc = setup().await;
        let err = svc.get_beat(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_changes_only_provided_fields() {
        let svc = setup().await;
        let created = svc.create_beat(input("Original", dec!(10.00))).await.unwrap();

        let updated = svc
            .update_beat(
                created.id,
                UpdateBeatInput {
                    price: Some(dec!(15.00)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Original");
        assert_eq!(updated.price, dec!(15.00));
    }

    #[tokio::test]
    async fn delete_removes_the_beat() {
        let svc = setup().await;
        let created = svc.create_beat(input("Gone", dec!(5.00))).await.unwrap();
        svc.delete_beat(created.id).await.unwrap();
        assert!(matches!(
            svc.get_beat(created.id).await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn negative_price_is_rejected() {
        let svc = setup().await;
        let err = svc.create_beat(input("Bad", dec!(-1.00))).await.unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }
}
