use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::{get, patch, post, put},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::AuthenticatedUser;
use crate::entities::subscription::{self, SubscriptionTier};
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::ApiResponse;

#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({ "tier": "Standard" }))]
pub struct SubscribeRequest {
    pub tier: SubscriptionTier,
}

/// Subscribe to a plan
#[utoipa::path(
    post,
    path = "/api/v1/subscriptions",
    request_body = SubscribeRequest,
    responses(
        (status = 201, description = "Subscription created", body = crate::ApiResponse<subscription::Model>),
        (status = 409, description = "Active subscription exists", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Subscriptions"
)]
pub async fn subscribe(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<SubscribeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<subscription::Model>>), ServiceError> {
    let subscription = state
        .services
        .subscriptions
        .subscribe(user.user_id, request.tier)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(subscription))))
}

/// The caller's active subscription
#[utoipa::path(
    get,
    path = "/api/v1/subscriptions/status",
    responses(
        (status = 200, description = "Active subscription", body = crate::ApiResponse<subscription::Model>),
        (status = 404, description = "No active subscription", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Subscriptions"
)]
pub async fn subscription_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<subscription::Model>>, ServiceError> {
    let subscription = state.services.subscriptions.status(user.user_id).await?;
    Ok(Json(ApiResponse::success(subscription)))
}

/// Cancel the active subscription
#[utoipa::path(
    put,
    path = "/api/v1/subscriptions/cancel",
    responses(
        (status = 200, description = "Subscription cancelled", body = crate::ApiResponse<subscription::Model>),
        (status = 404, description = "No active subscription", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Subscriptions"
)]
pub async fn cancel_subscription(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<subscription::Model>>, ServiceError> {
    let subscription = state.services.subscriptions.cancel(user.user_id).await?;
    Ok(Json(ApiResponse::success(subscription)))
}

/// Change the tier of the active subscription
#[utoipa::path(
    patch,
    path = "/api/v1/subscriptions",
    request_body = SubscribeRequest,
    responses(
        (status = 200, description = "Subscription updated", body = crate::ApiResponse<subscription::Model>),
        (status = 404, description = "No active subscription", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Subscriptions"
)]
pub async fn change_tier(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<SubscribeRequest>,
) -> Result<Json<ApiResponse<subscription::Model>>, ServiceError> {
    let subscription = state
        .services
        .subscriptions
        .change_tier(user.user_id, request.tier)
        .await?;
    Ok(Json(ApiResponse::success(subscription)))
}

/// Subscription routes
pub fn subscription_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(subscribe))
        .route("/", patch(change_tier))
        .route("/status", get(subscription_status))
        .route("/cancel", put(cancel_subscription))
}
