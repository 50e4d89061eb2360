use axum::{extract::State, routing::get, Json, Router};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::AdminUser;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::accounts::AccountProfile;
use crate::ApiResponse;

#[derive(Debug, Serialize, ToSchema)]
pub struct RevenueResponse {
    pub total_revenue: Decimal,
}

/// List all customer accounts
#[utoipa::path(
    get,
    path = "/api/v1/admin/customers",
    responses(
        (status = 200, description = "All accounts", body = crate::ApiResponse<Vec<AccountProfile>>),
        (status = 403, description = "Admins only", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<Vec<AccountProfile>>>, ServiceError> {
    let customers = state.services.accounts.list_customers().await?;
    Ok(Json(ApiResponse::success(customers)))
}

/// Total revenue across completed payments
#[utoipa::path(
    get,
    path = "/api/v1/admin/revenue",
    responses(
        (status = 200, description = "Revenue summary", body = crate::ApiResponse<RevenueResponse>),
        (status = 403, description = "Admins only", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn total_revenue(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<RevenueResponse>>, ServiceError> {
    let total_revenue = state.services.checkout.total_revenue().await?;
    Ok(Json(ApiResponse::success(RevenueResponse { total_revenue })))
}

/// Admin reporting routes
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers))
        .route("/revenue", get(total_revenue))
}
