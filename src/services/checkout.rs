//! Checkout orchestrator.
//!
//! Owns the pipeline from beat selection to download authorization:
//! pricing, payment-intent creation, webhook-driven fulfillment, and
//! entitlement grants. Checkout initiation is side-effect-free on local
//! state; the webhook handler is the only writer to the purchase ledger
//! and the entitlement store, and both writes are conditional on unique
//! indexes so redelivered events and concurrent deliveries converge on
//! the same rows.

use metrics::counter;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::payment::PaymentStatus;
use crate::entities::{beat, payment, purchased_beat, Beat, Payment, PurchasedBeat};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::stripe::{self, IntentMetadata, IntentObject, PaymentGateway};

/// Result of a successful checkout initiation: the client-side handle
/// plus the priced selection for display.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutIntent {
    pub client_secret: String,
    pub beats: Vec<beat::Model>,
    pub total: Decimal,
}

#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    gateway: Arc<dyn PaymentGateway>,
    event_sender: Arc<EventSender>,
    webhook_secret: Option<String>,
    webhook_tolerance_secs: u64,
    currency: String,
}

impl CheckoutService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        gateway: Arc<dyn PaymentGateway>,
        event_sender: Arc<EventSender>,
        webhook_secret: Option<String>,
        webhook_tolerance_secs: u64,
        currency: String,
    ) -> Self {
        Self {
            db,
            gateway,
            event_sender,
            webhook_secret,
            webhook_tolerance_secs,
            currency,
        }
    }

    /// Resolve a set of beat ids against the catalog and compute the
    /// exact total. Duplicate ids collapse to one priced instance; every
    /// id must resolve. No side effects.
    #[instrument(skip(self))]
    pub async fn price(&self, beat_ids: &[Uuid]) -> Result<(Vec<beat::Model>, Decimal), ServiceError> {
        let unique: BTreeSet<Uuid> = beat_ids.iter().copied().collect();
        if unique.is_empty() {
            return Err(ServiceError::InvalidInput(
                "at least one beat id is required".to_string(),
            ));
        }

        let beats = Beat::find()
            .filter(beat::Column::Id.is_in(unique.iter().copied()))
            .all(&*self.db)
            .await?;

        if beats.len() != unique.len() {
            let found: BTreeSet<Uuid> = beats.iter().map(|b| b.id).collect();
            let missing: Vec<String> = unique
                .difference(&found)
                .map(Uuid::to_string)
                .collect();
            return Err(ServiceError::NotFound(format!(
                "no beats found for ids: {}",
                missing.join(", ")
            )));
        }

        let total: Decimal = beats.iter().map(|b| b.price).sum();
        Ok((beats, total))
    }

    /// Price the selection and create a payment intent carrying the
    /// buyer and beat ids as metadata. Persists nothing locally — an
    /// intent that never succeeds leaves no trace here.
    #[instrument(skip(self))]
    pub async fn initiate_checkout(
        &self,
        beat_ids: &[Uuid],
        user_id: Uuid,
    ) -> Result<CheckoutIntent, ServiceError> {
        let (beats, total) = self.price(beat_ids).await?;

        let amount_minor = (total * Decimal::from(100))
            .round()
            .to_i64()
            .ok_or_else(|| {
                ServiceError::InternalError(format!("order total {} out of range", total))
            })?;

        let metadata = IntentMetadata::new(user_id, beats.iter().map(|b| b.id).collect());
        let intent = self
            .gateway
            .create_intent(amount_minor, &self.currency, &metadata)
            .await?;

        counter!("beatvault_checkout.intents_created", 1);
        self.event_sender
            .send(Event::CheckoutInitiated {
                user_id,
                beat_count: beats.len(),
                total,
            })
            .await;

        Ok(CheckoutIntent {
            client_secret: intent.client_secret,
            beats,
            total,
        })
    }

    /// Handle an asynchronous fulfillment notification from the gateway.
    ///
    /// Signature verification gates everything: without a configured
    /// secret or a valid signature no state changes. Event types other
    /// than the two payment-intent terminals are acknowledged untouched.
    #[instrument(skip(self, payload, signature_header))]
    pub async fn handle_fulfillment_event(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
    ) -> Result<(), ServiceError> {
        let secret = self.webhook_secret.as_deref().ok_or_else(|| {
            ServiceError::Unauthorized("webhook signing secret not configured".to_string())
        })?;
        let signature = signature_header.ok_or_else(|| {
            ServiceError::Unauthorized("missing webhook signature header".to_string())
        })?;

        let event =
            stripe::verify_and_parse_event(payload, signature, secret, self.webhook_tolerance_secs)?;

        match event.event_type.as_str() {
            "payment_intent.succeeded" => {
                self.record_fulfillment(&event.data.object, PaymentStatus::Completed)
                    .await
            }
            "payment_intent.payment_failed" => {
                self.record_fulfillment(&event.data.object, PaymentStatus::Failed)
                    .await
            }
            other => {
                info!(event_type = other, "ignoring unhandled webhook event type");
                Ok(())
            }
        }
    }

    /// Record the ledger row and grant entitlements.
    ///
    /// The ledger insert is conditional on the unique payment-intent
    /// index; a duplicate delivery inserts nothing. Entitlement grants
    /// run unconditionally afterwards (each conditional on the unique
    /// (user, beat) pair), so a retry after a partial failure completes
    /// the missing grants instead of being blocked by the ledger guard.
    async fn record_fulfillment(
        &self,
        intent: &IntentObject,
        status: PaymentStatus,
    ) -> Result<(), ServiceError> {
        let metadata = IntentMetadata::from_event_metadata(&intent.metadata)?;
        let amount = intent.charged_amount()?;
        let now = chrono::Utc::now();

        let ledger_row = payment::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(metadata.user_id),
            payment_intent_id: Set(intent.id.clone()),
            amount: Set(amount),
            status: Set(status),
            beat_ids: Set(serde_json::json!(metadata
                .beat_ids
                .iter()
                .map(Uuid::to_string)
                .collect::<Vec<_>>())),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = Payment::insert(ledger_row)
            .on_conflict(
                OnConflict::column(payment::Column::PaymentIntentId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&*self.db)
            .await?;

        // Re-read the authoritative row: on redelivery the insert was a
        // no-op and the id/status we just built are not the stored ones.
        let ledger = Payment::find()
            .filter(payment::Column::PaymentIntentId.eq(intent.id.as_str()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "ledger row for intent {} missing after insert",
                    intent.id
                ))
            })?;

        if inserted == 0 {
            counter!("beatvault_checkout.duplicate_events", 1);
            info!(intent_id = %intent.id, "fulfillment event already recorded");
        } else {
            match ledger.status {
                PaymentStatus::Failed => {
                    counter!("beatvault_checkout.payments_failed", 1);
                    self.event_sender
                        .send(Event::PaymentFailed {
                            payment_intent_id: intent.id.clone(),
                        })
                        .await;
                }
                _ => {
                    counter!("beatvault_checkout.payments_recorded", 1);
                    self.event_sender
                        .send(Event::PaymentRecorded {
                            payment_id: ledger.id,
                            payment_intent_id: intent.id.clone(),
                        })
                        .await;
                }
            }
        }

        if ledger.status != PaymentStatus::Completed {
            return Ok(());
        }

        for beat_id in &metadata.beat_ids {
            let grant = purchased_beat::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(metadata.user_id),
                beat_id: Set(*beat_id),
                payment_id: Set(ledger.id),
                granted_at: Set(chrono::Utc::now()),
            };

            let granted = PurchasedBeat::insert(grant)
                .on_conflict(
                    OnConflict::columns([
                        purchased_beat::Column::UserId,
                        purchased_beat::Column::BeatId,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .exec_without_returning(&*self.db)
                .await?;

            if granted > 0 {
                self.event_sender
                    .send(Event::EntitlementGranted {
                        user_id: metadata.user_id,
                        beat_id: *beat_id,
                    })
                    .await;
            }
        }

        Ok(())
    }

    /// True iff an entitlement exists for the pair. No side effects.
    pub async fn authorize_download(
        &self,
        user_id: Uuid,
        beat_id: Uuid,
    ) -> Result<bool, ServiceError> {
        let entitlement = PurchasedBeat::find()
            .filter(purchased_beat::Column::UserId.eq(user_id))
            .filter(purchased_beat::Column::BeatId.eq(beat_id))
            .one(&*self.db)
            .await?;
        Ok(entitlement.is_some())
    }

    /// Sum of all completed ledger amounts (admin reporting).
    pub async fn total_revenue(&self) -> Result<Decimal, ServiceError> {
        let completed = Payment::find()
            .filter(payment::Column::Status.eq(PaymentStatus::Completed))
            .all(&*self.db)
            .await?;
        Ok(completed.iter().map(|p| p.amount).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrator::Migrator;
    use crate::services::stripe::{compute_signature, MockPaymentGateway, PaymentIntent};
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use sea_orm::{Database, PaginatorTrait};
    use sea_orm_migration::MigratorTrait;
    use tokio::sync::mpsc;

    const WEBHOOK_SECRET: &str = "whsec_unit_test";

    async fn test_db() -> Arc<DatabaseConnection> {
        let db = Database::connect(crate::db::sqlite_test_options())
            .await
            .expect("sqlite in-memory connection");
        Migrator::up(&db, None).await.expect("migrations");
        Arc::new(db)
    }

    fn service(db: Arc<DatabaseConnection>, gateway: MockPaymentGateway) -> CheckoutService {
        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(crate::events::process_events(rx));
        CheckoutService::new(
            db,
            Arc::new(gateway),
            Arc::new(EventSender::new(tx)),
            Some(WEBHOOK_SECRET.to_string()),
            300,
            "usd".to_string(),
        )
    }

    async fn seed_beat(db: &DatabaseConnection, title: &str, price: Decimal) -> beat::Model {
        let now = chrono::Utc::now();
        let model = beat::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title.to_string()),
            artist: Set("Test Artist".to_string()),
            genre: Set("trap".to_string()),
            price: Set(price),
            audio_file: Set(format!("http://localhost/uploads/audio/{}.mp3", title)),
            image: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        use sea_orm::ActiveModelTrait;
        model.insert(db).await.expect("seed beat")
    }

    fn succeeded_event(intent_id: &str, amount_minor: i64, meta: &IntentMetadata) -> Vec<u8> {
        serde_json::json!({
            "id": format!("evt_{}", intent_id),
            "type": "payment_intent.succeeded",
            "data": { "object": {
                "id": intent_id,
                "amount": amount_minor,
                "amount_received": amount_minor,
                "metadata": {
                    "user_id": meta.user_id.to_string(),
                    "beat_ids": meta.beat_ids_json(),
                }
            }}
        })
        .to_string()
        .into_bytes()
    }

    fn failed_event(intent_id: &str, amount_minor: i64, meta: &IntentMetadata) -> Vec<u8> {
        serde_json::json!({
            "id": format!("evt_{}", intent_id),
            "type": "payment_intent.payment_failed",
            "data": { "object": {
                "id": intent_id,
                "amount": amount_minor,
                "metadata": {
                    "user_id": meta.user_id.to_string(),
                    "beat_ids": meta.beat_ids_json(),
                }
            }}
        })
        .to_string()
        .into_bytes()
    }

    fn sign(payload: &[u8]) -> String {
        let ts = chrono::Utc::now().timestamp();
        format!(
            "t={},v1={}",
            ts,
            compute_signature(ts, payload, WEBHOOK_SECRET)
        )
    }

    #[tokio::test]
    async fn price_sums_unique_ids() {
        let db = test_db().await;
        let a = seed_beat(&db, "a", dec!(12.50)).await;
        let b = seed_beat(&db, "b", dec!(7.25)).await;
        let svc = service(db, MockPaymentGateway::new());

        let (beats, total) = svc.price(&[a.id, b.id]).await.unwrap();
        assert_eq!(beats.len(), 2);
        assert_eq!(total, dec!(19.75));
    }

    #[tokio::test]
    async fn price_collapses_duplicate_ids() {
        let db = test_db().await;
        let a = seed_beat(&db, "a", dec!(12.50)).await;
        let svc = service(db, MockPaymentGateway::new());

        let (beats, total) = svc.price(&[a.id, a.id, a.id]).await.unwrap();
        assert_eq!(beats.len(), 1);
        assert_eq!(total, dec!(12.50));
    }

    #[tokio::test]
    async fn price_rejects_empty_input() {
        let db = test_db().await;
        let svc = service(db, MockPaymentGateway::new());

        let err = svc.price(&[]).await.unwrap_err();
        assert_matches!(err, ServiceError::InvalidInput(_));
    }

    #[tokio::test]
    async fn unknown_id_fails_without_gateway_call() {
        let db = test_db().await;
        let a = seed_beat(&db, "a", dec!(12.50)).await;

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_intent().never();
        let svc = service(db, gateway);

        let err = svc
            .initiate_checkout(&[a.id, Uuid::new_v4()], Uuid::new_v4())
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::NotFound(_));
    }

    #[tokio::test]
    async fn initiate_checkout_prices_and_returns_handle() {
        let db = test_db().await;
        let a = seed_beat(&db, "a", dec!(12.50)).await;
        let b = seed_beat(&db, "b", dec!(7.25)).await;
        let buyer = Uuid::new_v4();

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_create_intent()
            .withf(move |amount_minor, currency, meta| {
                *amount_minor == 1975 && currency == "usd" && meta.user_id == buyer
            })
            .times(1)
            .returning(|_, _, _| {
                Ok(PaymentIntent {
                    id: "pi_test_1".to_string(),
                    client_secret: "pi_test_1_secret".to_string(),
                })
            });
        let svc = service(db, gateway);

        let intent = svc.initiate_checkout(&[a.id, b.id], buyer).await.unwrap();
        assert_eq!(intent.client_secret, "pi_test_1_secret");
        assert_eq!(intent.total, dec!(19.75));
        assert_eq!(intent.beats.len(), 2);
    }

    #[tokio::test]
    async fn gateway_failure_surfaces_as_external_error() {
        let db = test_db().await;
        let a = seed_beat(&db, "a", dec!(12.50)).await;

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_intent().returning(|_, _, _| {
            Err(ServiceError::ExternalServiceError(
                "payment gateway unreachable".to_string(),
            ))
        });
        let svc = service(db, gateway);

        let err = svc
            .initiate_checkout(&[a.id], Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ExternalServiceError(_)));
    }

    #[tokio::test]
    async fn fulfillment_event_records_payment_and_entitlements() {
        let db = test_db().await;
        let a = seed_beat(&db, "a", dec!(12.50)).await;
        let b = seed_beat(&db, "b", dec!(7.25)).await;
        let buyer = Uuid::new_v4();
        let meta = IntentMetadata::new(buyer, vec![a.id, b.id]);
        let svc = service(db.clone(), MockPaymentGateway::new());

        let payload = succeeded_event("pi_flow_1", 1975, &meta);
        svc.handle_fulfillment_event(&payload, Some(&sign(&payload)))
            .await
            .unwrap();

        let ledger = Payment::find().all(&*db).await.unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].amount, dec!(19.75));
        assert_eq!(ledger[0].status, PaymentStatus::Completed);
        assert_eq!(ledger[0].user_id, buyer);

        assert!(svc.authorize_download(buyer, a.id).await.unwrap());
        assert!(svc.authorize_download(buyer, b.id).await.unwrap());
        // An unrelated buyer gains nothing.
        assert!(!svc.authorize_download(Uuid::new_v4(), a.id).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_delivery_is_a_no_op() {
        let db = test_db().await;
        let a = seed_beat(&db, "a", dec!(12.50)).await;
        let buyer = Uuid::new_v4();
        let meta = IntentMetadata::new(buyer, vec![a.id]);
        let svc = service(db.clone(), MockPaymentGateway::new());

        let payload = succeeded_event("pi_dup", 1250, &meta);
        let sig = sign(&payload);
        svc.handle_fulfillment_event(&payload, Some(&sig))
            .await
            .unwrap();
        svc.handle_fulfillment_event(&payload, Some(&sig))
            .await
            .unwrap();

        assert_eq!(Payment::find().count(&*db).await.unwrap(), 1);
        assert_eq!(PurchasedBeat::find().count(&*db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn invalid_signature_mutates_nothing() {
        let db = test_db().await;
        let a = seed_beat(&db, "a", dec!(12.50)).await;
        let meta = IntentMetadata::new(Uuid::new_v4(), vec![a.id]);
        let svc = service(db.clone(), MockPaymentGateway::new());

        let payload = succeeded_event("pi_forged", 1250, &meta);
        let err = svc
            .handle_fulfillment_event(&payload, Some("t=1,v1=deadbeef"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        assert_eq!(Payment::find().count(&*db).await.unwrap(), 0);
        assert_eq!(PurchasedBeat::find().count(&*db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_metadata_is_malformed() {
        let db = test_db().await;
        let svc = service(db.clone(), MockPaymentGateway::new());

        let payload = serde_json::json!({
            "type": "payment_intent.succeeded",
            "data": { "object": { "id": "pi_bare", "amount_received": 100, "metadata": {} } }
        })
        .to_string()
        .into_bytes();

        let err = svc
            .handle_fulfillment_event(&payload, Some(&sign(&payload)))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
        assert_eq!(Payment::find().count(&*db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unhandled_event_types_are_acknowledged() {
        let db = test_db().await;
        let svc = service(db.clone(), MockPaymentGateway::new());

        let payload = serde_json::json!({
            "type": "charge.updated",
            "data": { "object": { "id": "ch_1", "metadata": {} } }
        })
        .to_string()
        .into_bytes();

        svc.handle_fulfillment_event(&payload, Some(&sign(&payload)))
            .await
            .unwrap();
        assert_eq!(Payment::find().count(&*db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn failed_payment_is_recorded_without_entitlements() {
        let db = test_db().await;
        let a = seed_beat(&db, "a", dec!(12.50)).await;
        let buyer = Uuid::new_v4();
        let meta = IntentMetadata::new(buyer, vec![a.id]);
        let svc = service(db.clone(), MockPaymentGateway::new());

        let payload = failed_event("pi_failed", 1250, &meta);
        svc.handle_fulfillment_event(&payload, Some(&sign(&payload)))
            .await
            .unwrap();

        let ledger = Payment::find().all(&*db).await.unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].status, PaymentStatus::Failed);
        assert_eq!(PurchasedBeat::find().count(&*db).await.unwrap(), 0);
        assert!(!svc.authorize_download(buyer, a.id).await.unwrap());
    }

    #[tokio::test]
    async fn redelivery_completes_partially_applied_grants() {
        let db = test_db().await;
        let a = seed_beat(&db, "a", dec!(12.50)).await;
        let b = seed_beat(&db, "b", dec!(7.25)).await;
        let buyer = Uuid::new_v4();
        let meta = IntentMetadata::new(buyer, vec![a.id, b.id]);
        let svc = service(db.clone(), MockPaymentGateway::new());

        // Simulate a crash after the ledger insert and one of two grants.
        use sea_orm::ActiveModelTrait;
        let now = chrono::Utc::now();
        let ledger = payment::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(buyer),
            payment_intent_id: Set("pi_partial".to_string()),
            amount: Set(dec!(19.75)),
            status: Set(PaymentStatus::Completed),
            beat_ids: Set(serde_json::json!([a.id.to_string(), b.id.to_string()])),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*db)
        .await
        .unwrap();
        purchased_beat::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(buyer),
            beat_id: Set(a.id),
            payment_id: Set(ledger.id),
            granted_at: Set(now),
        }
        .insert(&*db)
        .await
        .unwrap();

        let payload = succeeded_event("pi_partial", 1975, &meta);
        svc.handle_fulfillment_event(&payload, Some(&sign(&payload)))
            .await
            .unwrap();

        // Ledger untouched, the missing grant applied exactly once.
        assert_eq!(Payment::find().count(&*db).await.unwrap(), 1);
        assert_eq!(PurchasedBeat::find().count(&*db).await.unwrap(), 2);
        assert!(svc.authorize_download(buyer, b.id).await.unwrap());
    }

    #[tokio::test]
    async fn every_entitlement_traces_to_a_completed_payment() {
        let db = test_db().await;
        let a = seed_beat(&db, "a", dec!(12.50)).await;
        let b = seed_beat(&db, "b", dec!(7.25)).await;
        let buyer = Uuid::new_v4();
        let meta = IntentMetadata::new(buyer, vec![a.id, b.id]);
        let svc = service(db.clone(), MockPaymentGateway::new());

        let payload = succeeded_event("pi_trace", 1975, &meta);
        svc.handle_fulfillment_event(&payload, Some(&sign(&payload)))
            .await
            .unwrap();

        for entitlement in PurchasedBeat::find().all(&*db).await.unwrap() {
            let ledger = Payment::find_by_id(entitlement.payment_id)
                .one(&*db)
                .await
                .unwrap()
                .expect("entitlement must reference a ledger row");
            assert_eq!(ledger.status, PaymentStatus::Completed);
            assert_eq!(ledger.user_id, entitlement.user_id);
            let ids: Vec<String> =
                serde_json::from_value(ledger.beat_ids.clone()).expect("ledger beat ids");
            assert!(ids.contains(&entitlement.beat_id.to_string()));
        }
    }

    #[tokio::test]
    async fn revenue_sums_completed_only() {
        let db = test_db().await;
        let a = seed_beat(&db, "a", dec!(12.50)).await;
        let buyer = Uuid::new_v4();
        let svc = service(db.clone(), MockPaymentGateway::new());

        let ok = succeeded_event("pi_rev_1", 1250, &IntentMetadata::new(buyer, vec![a.id]));
        svc.handle_fulfillment_event(&ok, Some(&sign(&ok)))
            .await
            .unwrap();
        let failed = failed_event(
            "pi_rev_2",
            9900,
            &IntentMetadata::new(Uuid::new_v4(), vec![a.id]),
        );
        svc.handle_fulfillment_event(&failed, Some(&sign(&failed)))
            .await
            .unwrap();

        assert_eq!(svc.total_revenue().await.unwrap(), dec!(12.50));
    }

    #[tokio::test]
    async fn missing_webhook_secret_rejects_everything() {
        let db = test_db().await;
        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(crate::events::process_events(rx));
        let svc = CheckoutService::new(
            db.clone(),
            Arc::new(MockPaymentGateway::new()),
            Arc::new(EventSender::new(tx)),
            None,
            300,
            "usd".to_string(),
        );

        let payload = b"{}".to_vec();
        let err = svc
            .handle_fulfillment_event(&payload, Some("t=1,v1=aa"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }
}
