use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::entities::favorite;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::favorites::FavoriteBeat;
use crate::ApiResponse;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddFavoriteRequest {
    pub beat_id: Uuid,
}

/// Add a beat to the caller's favorites
#[utoipa::path(
    post,
    path = "/api/v1/favorites",
    request_body = AddFavoriteRequest,
    responses(
        (status = 201, description = "Favorite added"),
        (status = 404, description = "Unknown beat", body = crate::errors::ErrorResponse),
        (status = 409, description = "Already favorited", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn add_favorite(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<AddFavoriteRequest>,
) -> Result<(StatusCode, Json<ApiResponse<favorite::Model>>), ServiceError> {
    let favorite = state
        .services
        .favorites
        .add_favorite(user.user_id, request.beat_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(favorite))))
}

/// List the caller's favorites
#[utoipa::path(
    get,
    path = "/api/v1/favorites",
    responses(
        (status = 200, description = "Favorites listing", body = crate::ApiResponse<Vec<FavoriteBeat>>)
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn list_favorites(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<FavoriteBeat>>>, ServiceError> {
    let favorites = state.services.favorites.list_favorites(user.user_id).await?;
    Ok(Json(ApiResponse::success(favorites)))
}

/// Favorites routes
pub fn favorite_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(add_favorite))
        .route("/", get(list_favorites))
}
