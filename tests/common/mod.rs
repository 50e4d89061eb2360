//! Shared harness for integration tests: an in-memory SQLite database,
//! a deterministic fake payment gateway, and helpers for driving the
//! router with `tower::ServiceExt::oneshot`.

// Each test binary compiles its own copy; not every binary uses every helper.
#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
    Router,
};
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use beatvault_api::{
    app_router,
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    entities::beat,
    errors::ServiceError,
    events::{self, EventSender},
    handlers::AppServices,
    migrator::Migrator,
    rate_limiter::LoginRateLimiter,
    services::catalog::CreateBeatInput,
    services::stripe::{compute_signature, IntentMetadata, PaymentGateway, PaymentIntent},
    AppState,
};

pub const WEBHOOK_SECRET: &str = "whsec_integration_test";
pub const JWT_SECRET: &str = "integration_test_jwt_secret_that_is_long_enough";

/// Deterministic gateway stand-in: hands out sequentially numbered
/// intents and never talks to the network.
struct FakeGateway {
    counter: AtomicU64,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_intent(
        &self,
        _amount_minor: i64,
        _currency: &str,
        _metadata: &IntentMetadata,
    ) -> Result<PaymentIntent, ServiceError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(PaymentIntent {
            id: format!("pi_test_{}", n),
            client_secret: format!("pi_test_{}_secret", n),
        })
    }
}

pub struct TestApp {
    router: Router,
    pub state: AppState,
    _upload_dir: tempfile::TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let upload_dir = tempfile::tempdir().expect("upload tempdir");

        let mut cfg = AppConfig::new("sqlite::memory:", JWT_SECRET, "sk_test_fake", "test");
        cfg.payment_webhook_secret = Some(WEBHOOK_SECRET.to_string());
        cfg.upload_dir = upload_dir.path().to_string_lossy().into_owned();

        let mut opt = ConnectOptions::new(cfg.database_url.clone());
        opt.max_connections(1).sqlx_logging(false);
        let db = Database::connect(opt).await.expect("test database");
        Migrator::up(&db, None).await.expect("migrations");
        let db_arc = Arc::new(db);

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        tokio::spawn(events::process_events(event_rx));

        let auth_service = Arc::new(AuthService::new(AuthConfig::new(
            cfg.jwt_secret.clone(),
            cfg.auth_issuer.clone(),
            cfg.auth_audience.clone(),
            Duration::from_secs(cfg.jwt_expiration),
        )));

        let gateway = Arc::new(FakeGateway {
            counter: AtomicU64::new(1),
        });

        let services = AppServices::new(
            db_arc.clone(),
            Arc::new(event_sender.clone()),
            auth_service.clone(),
            gateway,
            &cfg,
        );

        let login_limiter = Arc::new(LoginRateLimiter::new(
            cfg.login_rate_limit_attempts,
            Duration::from_secs(cfg.login_rate_limit_window_secs),
        ));

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            auth: auth_service,
            services,
            login_limiter,
        };

        Self {
            router: app_router(state.clone()),
            state,
            _upload_dir: upload_dir,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(value) => builder
                .header("content-type", "application/json")
                .body(Body::from(value.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        self.router.clone().oneshot(request).await.expect("response")
    }

    /// Raw request with arbitrary extra headers (rate-limit keys,
    /// multipart bodies, webhook signatures).
    pub async fn raw_request(
        &self,
        method: Method,
        uri: &str,
        headers: &[(&str, &str)],
        body: Vec<u8>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::from(body)).expect("request");
        self.router.clone().oneshot(request).await.expect("response")
    }

    pub async fn register_user(&self, email: &str, password: &str) -> Response {
        self.request(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({
                "email": email,
                "password": password,
                "first_name": "Test",
                "last_name": "Buyer",
                "city": "Lagos",
                "state": "LA",
                "country": "NG",
                "age": 24,
            })),
            None,
        )
        .await
    }

    /// Register + login a user; returns (user_id, bearer token).
    pub async fn user_with_token(&self, email: &str) -> (Uuid, String) {
        let password = "S3cure!pass";
        let response = self.register_user(email, password).await;
        assert_eq!(response.status(), 201, "registration should succeed");
        let body = response_json(response).await;
        let user_id = Uuid::parse_str(body["data"]["id"].as_str().expect("user id")).unwrap();

        let response = self
            .request(
                Method::POST,
                "/api/v1/auth/login",
                Some(json!({ "email": email, "password": password })),
                None,
            )
            .await;
        assert_eq!(response.status(), 200, "login should succeed");
        let body = response_json(response).await;
        let token = body["data"]["token"].as_str().expect("token").to_string();
        (user_id, token)
    }

    /// Register + login an admin; returns the bearer token.
    pub async fn admin_token(&self, email: &str) -> String {
        let password = "Adm1n!pass";
        let response = self
            .request(
                Method::POST,
                "/api/v1/auth/register-admin",
                Some(json!({ "email": email, "password": password })),
                None,
            )
            .await;
        assert_eq!(response.status(), 201, "admin registration should succeed");

        let response = self
            .request(
                Method::POST,
                "/api/v1/auth/login-admin",
                Some(json!({ "email": email, "password": password })),
                None,
            )
            .await;
        assert_eq!(response.status(), 200, "admin login should succeed");
        let body = response_json(response).await;
        body["data"]["token"].as_str().expect("token").to_string()
    }

    /// Seed a beat directly through the catalog service.
    pub async fn seed_beat(&self, title: &str, price: Decimal) -> beat::Model {
        self.state
            .services
            .catalog
            .create_beat(CreateBeatInput {
                title: title.to_string(),
                artist: "Integration Artist".to_string(),
                genre: "trap".to_string(),
                price,
                audio_file: format!("http://localhost:8080/uploads/audio/{}.mp3", title),
                image: None,
            })
            .await
            .expect("seed beat")
    }

    pub fn sign_webhook(&self, payload: &[u8]) -> String {
        let ts = chrono::Utc::now().timestamp();
        format!(
            "t={},v1={}",
            ts,
            compute_signature(ts, payload, WEBHOOK_SECRET)
        )
    }

    pub async fn deliver_webhook(&self, payload: Vec<u8>, signature: Option<&str>) -> Response {
        let mut headers: Vec<(&str, &str)> = vec![("content-type", "application/json")];
        if let Some(sig) = signature {
            headers.push(("Stripe-Signature", sig));
        }
        self.raw_request(Method::POST, "/api/v1/checkout/webhook", &headers, payload)
            .await
    }
}

/// A signed `payment_intent.succeeded` payload for the given intent.
pub fn succeeded_event(intent_id: &str, amount_minor: i64, user_id: Uuid, beat_ids: &[Uuid]) -> Vec<u8> {
    json!({
        "id": format!("evt_{}", intent_id),
        "type": "payment_intent.succeeded",
        "data": { "object": {
            "id": intent_id,
            "amount": amount_minor,
            "amount_received": amount_minor,
            "metadata": {
                "user_id": user_id.to_string(),
                "beat_ids": serde_json::to_string(
                    &beat_ids.iter().map(Uuid::to_string).collect::<Vec<_>>()
                ).unwrap(),
            }
        }}
    })
    .to_string()
    .into_bytes()
}

pub async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

/// Parse a serialized decimal field. Comparisons go through [`Decimal`]
/// so trailing zeros lost in storage do not fail the assertion.
pub fn decimal_field(value: &Value) -> Decimal {
    value
        .as_str()
        .expect("decimal field serialized as string")
        .parse()
        .expect("parseable decimal")
}
