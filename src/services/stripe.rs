//! Payment gateway adapter.
//!
//! Wraps the external payment processor behind the [`PaymentGateway`]
//! trait so the checkout orchestrator never sees HTTP or wire formats.
//! Monetary amounts cross this boundary in minor units (cents); webhook
//! payload metadata crosses as strings and is promoted to
//! [`IntentMetadata`] immediately on parse.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{error, instrument, warn};
use uuid::Uuid;

use crate::errors::ServiceError;

type HmacSha256 = Hmac<Sha256>;

/// Gateway credentials and endpoint, injected at construction.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub api_base: String,
    pub request_timeout: Duration,
}

impl StripeConfig {
    pub fn new(secret_key: String, api_base: String) -> Self {
        Self {
            secret_key,
            api_base,
            request_timeout: Duration::from_secs(15),
        }
    }
}

/// Typed payment-intent metadata. Serialized to gateway key/value pairs
/// on the way out and recovered verbatim from fulfillment events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentMetadata {
    pub user_id: Uuid,
    pub beat_ids: Vec<Uuid>,
}

impl IntentMetadata {
    pub fn new(user_id: Uuid, beat_ids: Vec<Uuid>) -> Self {
        Self { user_id, beat_ids }
    }

    /// The beat-id set as the JSON array string stored on the intent.
    pub fn beat_ids_json(&self) -> String {
        serde_json::to_string(
            &self
                .beat_ids
                .iter()
                .map(Uuid::to_string)
                .collect::<Vec<_>>(),
        )
        .unwrap_or_else(|_| "[]".to_string())
    }

    /// Recover metadata from the string map carried by a fulfillment
    /// event. Both keys are required; the beat-id set must parse back to
    /// the JSON array written by [`Self::beat_ids_json`].
    pub fn from_event_metadata(metadata: &HashMap<String, String>) -> Result<Self, ServiceError> {
        let user_id = metadata
            .get("user_id")
            .ok_or_else(|| ServiceError::BadRequest("event metadata missing user_id".into()))?;
        let user_id = Uuid::parse_str(user_id)
            .map_err(|_| ServiceError::BadRequest("event metadata user_id is not a UUID".into()))?;

        let raw_ids = metadata
            .get("beat_ids")
            .ok_or_else(|| ServiceError::BadRequest("event metadata missing beat_ids".into()))?;
        let ids: Vec<String> = serde_json::from_str(raw_ids)
            .map_err(|_| ServiceError::BadRequest("event metadata beat_ids is not valid JSON".into()))?;
        let beat_ids = ids
            .iter()
            .map(|s| Uuid::parse_str(s))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| {
                ServiceError::BadRequest("event metadata beat_ids contains a non-UUID entry".into())
            })?;

        if beat_ids.is_empty() {
            return Err(ServiceError::BadRequest(
                "event metadata beat_ids is empty".into(),
            ));
        }

        Ok(Self { user_id, beat_ids })
    }
}

/// A freshly created payment intent: the gateway id plus the client-side
/// handle the buyer completes payment with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

/// Verified, parsed fulfillment event.
#[derive(Debug, Clone, Deserialize)]
pub struct FulfillmentEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: FulfillmentEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FulfillmentEventData {
    pub object: IntentObject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntentObject {
    pub id: String,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub amount_received: Option<i64>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl IntentObject {
    /// Charged amount in major units. Succeeded events report
    /// `amount_received`; failure events only carry the requested
    /// `amount`.
    pub fn charged_amount(&self) -> Result<Decimal, ServiceError> {
        let minor = self
            .amount_received
            .filter(|v| *v > 0)
            .or(self.amount)
            .ok_or_else(|| ServiceError::BadRequest("event is missing an amount".into()))?;
        Ok(Decimal::new(minor, 2))
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent for `amount_minor` (smallest currency
    /// unit) with the given metadata attached.
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        metadata: &IntentMetadata,
    ) -> Result<PaymentIntent, ServiceError>;
}

/// HTTP implementation of [`PaymentGateway`] against the Stripe API.
pub struct StripeGateway {
    config: StripeConfig,
    http: reqwest::Client,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_default();
        Self { config, http }
    }
}

#[derive(Debug, Deserialize)]
struct StripeIntentResponse {
    id: String,
    client_secret: String,
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip(self, metadata))]
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        metadata: &IntentMetadata,
    ) -> Result<PaymentIntent, ServiceError> {
        let params = [
            ("amount", amount_minor.to_string()),
            ("currency", currency.to_string()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
            ("metadata[user_id]", metadata.user_id.to_string()),
            ("metadata[beat_ids]", metadata.beat_ids_json()),
        ];

        let response = self
            .http
            .post(format!("{}/v1/payment_intents", self.config.api_base))
            .bearer_auth(&self.config.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                error!("payment intent request failed: {}", e);
                ServiceError::ExternalServiceError("payment gateway unreachable".to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, "payment gateway rejected intent creation: {}", body);
            return Err(ServiceError::ExternalServiceError(format!(
                "payment gateway returned {}",
                status
            )));
        }

        let intent: StripeIntentResponse = response.json().await.map_err(|e| {
            error!("failed to decode payment intent response: {}", e);
            ServiceError::ExternalServiceError("invalid payment gateway response".to_string())
        })?;

        Ok(PaymentIntent {
            id: intent.id,
            client_secret: intent.client_secret,
        })
    }
}

/// Compute the hex HMAC-SHA256 signature the gateway attaches to
/// `"{timestamp}.{payload}"`.
pub fn compute_signature(timestamp: i64, payload: &[u8], secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a `Stripe-Signature` header (`t=<ts>,v1=<hex>`) against the raw
/// request body. The timestamp must fall within `tolerance_secs` of now.
pub fn verify_webhook_signature(
    signature_header: &str,
    payload: &[u8],
    secret: &str,
    tolerance_secs: u64,
) -> bool {
    let mut ts = "";
    let mut v1 = "";
    for part in signature_header.split(',') {
        let mut it = part.trim().splitn(2, '=');
        match (it.next(), it.next()) {
            (Some("t"), Some(val)) => ts = val,
            (Some("v1"), Some(val)) => v1 = val,
            _ => {}
        }
    }

    if ts.is_empty() || v1.is_empty() {
        return false;
    }

    let ts_i = match ts.parse::<i64>() {
        Ok(v) => v,
        Err(_) => return false,
    };
    let now = chrono::Utc::now().timestamp();
    if (now - ts_i).unsigned_abs() > tolerance_secs {
        warn!("webhook signature timestamp outside tolerance");
        return false;
    }

    constant_time_eq(&compute_signature(ts_i, payload, secret), v1)
}

/// Verify the signature and decode the payload in one step.
pub fn verify_and_parse_event(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
    tolerance_secs: u64,
) -> Result<FulfillmentEvent, ServiceError> {
    if !verify_webhook_signature(signature_header, payload, secret, tolerance_secs) {
        return Err(ServiceError::Unauthorized(
            "invalid webhook signature".to_string(),
        ));
    }

    serde_json::from_slice(payload)
        .map_err(|e| ServiceError::BadRequest(format!("invalid event payload: {}", e)))
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";

    fn signed_header(payload: &[u8]) -> String {
        let ts = chrono::Utc::now().timestamp();
        format!("t={},v1={}", ts, compute_signature(ts, payload, SECRET))
    }

    #[test]
    fn valid_signature_verifies() {
        let payload = br#"{"type":"payment_intent.succeeded"}"#;
        let header = signed_header(payload);
        assert!(verify_webhook_signature(&header, payload, SECRET, 300));
    }

    #[test]
    fn tampered_payload_fails() {
        let payload = br#"{"type":"payment_intent.succeeded"}"#;
        let header = signed_header(payload);
        assert!(!verify_webhook_signature(
            &header,
            br#"{"type":"payment_intent.succeeded","amount":1}"#,
            SECRET,
            300
        ));
    }

    #[test]
    fn wrong_secret_fails() {
        let payload = b"{}";
        let header = signed_header(payload);
        assert!(!verify_webhook_signature(&header, payload, "whsec_other", 300));
    }

    #[test]
    fn stale_timestamp_fails() {
        let payload = b"{}";
        let ts = chrono::Utc::now().timestamp() - 3600;
        let header = format!("t={},v1={}", ts, compute_signature(ts, payload, SECRET));
        assert!(!verify_webhook_signature(&header, payload, SECRET, 300));
    }

    #[test]
    fn malformed_header_fails() {
        assert!(!verify_webhook_signature("v1=deadbeef", b"{}", SECRET, 300));
        assert!(!verify_webhook_signature("t=notanumber,v1=x", b"{}", SECRET, 300));
        assert!(!verify_webhook_signature("", b"{}", SECRET, 300));
    }

    #[test]
    fn metadata_roundtrip() {
        let meta = IntentMetadata::new(Uuid::new_v4(), vec![Uuid::new_v4(), Uuid::new_v4()]);
        let mut map = HashMap::new();
        map.insert("user_id".to_string(), meta.user_id.to_string());
        map.insert("beat_ids".to_string(), meta.beat_ids_json());

        let recovered = IntentMetadata::from_event_metadata(&map).unwrap();
        assert_eq!(recovered, meta);
    }

    #[test]
    fn metadata_rejects_missing_fields() {
        let mut map = HashMap::new();
        map.insert("user_id".to_string(), Uuid::new_v4().to_string());
        assert!(IntentMetadata::from_event_metadata(&map).is_err());

        let mut map = HashMap::new();
        map.insert("beat_ids".to_string(), "[]".to_string());
        assert!(IntentMetadata::from_event_metadata(&map).is_err());
    }

    #[test]
    fn charged_amount_prefers_amount_received() {
        let obj = IntentObject {
            id: "pi_1".to_string(),
            amount: Some(500),
            amount_received: Some(1975),
            metadata: HashMap::new(),
        };
        assert_eq!(obj.charged_amount().unwrap(), Decimal::new(1975, 2));

        let failed = IntentObject {
            id: "pi_2".to_string(),
            amount: Some(500),
            amount_received: None,
            metadata: HashMap::new(),
        };
        assert_eq!(failed.charged_amount().unwrap(), Decimal::new(500, 2));
    }
}
