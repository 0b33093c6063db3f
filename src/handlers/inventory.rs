use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::errors::ServiceError;
use crate::services::inventory::UpsertInventoryLevel;
use crate::{ApiResponse, AppState};

/// Create the inventory router
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_inventory).put(upsert_inventory))
}

/// List all stock levels
#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    responses(
        (status = 200, description = "Inventory list returned", body = [crate::models::inventory::InventoryLevel]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn list_inventory(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let levels = state.services.inventory.list_levels().await?;
    Ok(Json(ApiResponse::success(levels)))
}

/// Set the stock level for one (fraction, capacity) pair
///
/// Creates the row on first reference. Statuses of pending requests are
/// recalculated afterwards, since the edit may unblock or starve them.
#[utoipa::path(
    put,
    path = "/api/v1/inventory",
    request_body = UpsertInventoryLevel,
    responses(
        (status = 200, description = "Inventory level set", body = crate::models::inventory::InventoryLevel),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn upsert_inventory(
    State(state): State<AppState>,
    Json(payload): Json<UpsertInventoryLevel>,
) -> Result<impl IntoResponse, ServiceError> {
    let level = state.services.inventory.set_level(payload).await?;
    state.services.requests.recalculate_and_persist().await?;
    Ok(Json(ApiResponse::success(level)))
}
