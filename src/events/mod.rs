use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the services. Consumed by a background task;
/// handlers must never block on delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Account events
    UserRegistered(Uuid),
    AdminRegistered(Uuid),

    // Catalog events
    BeatUploaded(Uuid),
    BeatUpdated(Uuid),
    BeatDeleted(Uuid),

    // Checkout pipeline events
    CheckoutInitiated {
        user_id: Uuid,
        beat_count: usize,
        total: Decimal,
    },
    PaymentRecorded {
        payment_id: Uuid,
        payment_intent_id: String,
    },
    PaymentFailed {
        payment_intent_id: String,
    },
    EntitlementGranted {
        user_id: Uuid,
        beat_id: Uuid,
    },

    // Engagement events
    FavoriteAdded {
        user_id: Uuid,
        beat_id: Uuid,
    },
    SubscriptionCreated(Uuid),
    SubscriptionUpdated(Uuid),
    SubscriptionCancelled(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously. Delivery is best-effort: a full or
    /// closed channel is logged and dropped, never surfaced to the caller.
    pub async fn send(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            warn!("Failed to send event: {}", e);
        }
    }
}

/// Background consumer for domain events. Currently logs each event;
/// outbound integrations hang off this loop.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::PaymentRecorded {
                payment_id,
                payment_intent_id,
            } => {
                info!(%payment_id, %payment_intent_id, "payment recorded");
            }
            Event::PaymentFailed { payment_intent_id } => {
                warn!(%payment_intent_id, "payment failed");
            }
            other => {
                info!(event = ?other, "event processed");
            }
        }
    }
    info!("event channel closed; processor exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dropped_receiver_does_not_panic_sender() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let sender = EventSender::new(tx);
        sender.send(Event::BeatUploaded(Uuid::new_v4())).await;
    }
}
