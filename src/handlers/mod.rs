pub mod admin;
pub mod auth;
pub mod beats;
pub mod checkout;
pub mod common;
pub mod favorites;
pub mod subscriptions;
pub mod users;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::stripe::PaymentGateway;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub accounts: Arc<crate::services::accounts::AccountService>,
    pub catalog: Arc<crate::services::catalog::BeatCatalogService>,
    pub checkout: Arc<crate::services::checkout::CheckoutService>,
    pub favorites: Arc<crate::services::favorites::FavoriteService>,
    pub subscriptions: Arc<crate::services::subscriptions::SubscriptionService>,
    pub file_store: Arc<crate::services::storage::FileStore>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        auth_service: Arc<crate::auth::AuthService>,
        gateway: Arc<dyn PaymentGateway>,
        config: &AppConfig,
    ) -> Self {
        let accounts = Arc::new(crate::services::accounts::AccountService::new(
            db_pool.clone(),
            auth_service,
            event_sender.clone(),
        ));
        let catalog = Arc::new(crate::services::catalog::BeatCatalogService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let checkout = Arc::new(crate::services::checkout::CheckoutService::new(
            db_pool.clone(),
            gateway,
            event_sender.clone(),
            config.payment_webhook_secret.clone(),
            config.payment_webhook_tolerance_secs,
            config.currency.clone(),
        ));
        let favorites = Arc::new(crate::services::favorites::FavoriteService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let subscriptions = Arc::new(crate::services::subscriptions::SubscriptionService::new(
            db_pool,
            event_sender,
        ));
        let file_store = Arc::new(crate::services::storage::FileStore::new(
            config.upload_dir.clone(),
            config.public_base_url.clone(),
        ));

        Self {
            accounts,
            catalog,
            checkout,
            favorites,
            subscriptions,
            file_store,
        }
    }
}
