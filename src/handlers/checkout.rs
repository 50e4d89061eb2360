//! HTTP surface of the checkout pipeline: intent creation for the
//! authenticated buyer, the signature-verified fulfillment webhook, and
//! the entitlement-gated download link.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::checkout::CheckoutIntent;
use crate::ApiResponse;

#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({ "beat_ids": ["550e8400-e29b-41d4-a716-446655440000"] }))]
pub struct CreatePaymentIntentRequest {
    pub beat_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DownloadResponse {
    pub download_url: String,
}

/// Price the selected beats and create a payment intent
#[utoipa::path(
    post,
    path = "/api/v1/checkout/payment-intent",
    request_body = CreatePaymentIntentRequest,
    responses(
        (status = 200, description = "Intent created", body = crate::ApiResponse<CheckoutIntent>),
        (status = 400, description = "Empty or malformed beat ids", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown beat id", body = crate::errors::ErrorResponse),
        (status = 502, description = "Payment gateway unavailable", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreatePaymentIntentRequest>,
) -> Result<Json<ApiResponse<CheckoutIntent>>, ServiceError> {
    let intent = state
        .services
        .checkout
        .initiate_checkout(&request.beat_ids, user.user_id)
        .await?;
    Ok(Json(ApiResponse::success(intent)))
}

/// Payment gateway fulfillment webhook.
///
/// 200 acknowledges handled or intentionally ignored events; 401/400 is
/// the retry signal the gateway acts on. Authentication is the request
/// signature, never a bearer token.
#[utoipa::path(
    post,
    path = "/api/v1/checkout/webhook",
    request_body = String,
    responses(
        (status = 200, description = "Event handled or ignored"),
        (status = 400, description = "Malformed event payload", body = crate::errors::ErrorResponse),
        (status = 401, description = "Invalid signature", body = crate::errors::ErrorResponse)
    ),
    tag = "Checkout"
)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ServiceError> {
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok());

    state
        .services
        .checkout
        .handle_fulfillment_event(&body, signature)
        .await?;

    Ok(StatusCode::OK)
}

/// Fetch the download link for a purchased beat
#[utoipa::path(
    get,
    path = "/api/v1/checkout/download/:beat_id",
    params(("beat_id" = Uuid, Path, description = "Beat ID")),
    responses(
        (status = 200, description = "Download link", body = crate::ApiResponse<DownloadResponse>),
        (status = 403, description = "Beat not purchased", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown beat", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn download_beat(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(beat_id): Path<Uuid>,
) -> Result<Json<ApiResponse<DownloadResponse>>, ServiceError> {
    if !state
        .services
        .checkout
        .authorize_download(user.user_id, beat_id)
        .await?
    {
        return Err(ServiceError::Forbidden(
            "You have not purchased this beat.".to_string(),
        ));
    }

    let beat = state.services.catalog.get_beat(beat_id).await?;
    Ok(Json(ApiResponse::success(DownloadResponse {
        download_url: beat.audio_file,
    })))
}

/// Checkout routes
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/payment-intent", post(create_payment_intent))
        .route("/webhook", post(payment_webhook))
        .route("/download/:beat_id", get(download_beat))
}
