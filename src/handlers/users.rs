use axum::{extract::State, routing::get, Json, Router};

use crate::auth::AuthenticatedUser;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::accounts::AccountProfile;
use crate::ApiResponse;

/// The authenticated account's profile
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current profile", body = crate::ApiResponse<AccountProfile>),
        (status = 401, description = "Missing token", body = crate::errors::ErrorResponse),
        (status = 404, description = "Account removed", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<AccountProfile>>, ServiceError> {
    let profile = state.services.accounts.profile(user.user_id).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// User routes
pub fn user_routes() -> Router<AppState> {
    Router::new().route("/me", get(me))
}
