use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::request::{ContainerRequest, RequestItemDetail};
use crate::services::requests::{NewContainerRequest, RequestFilters};
use crate::{ApiResponse, AppState};

/// API representation of a container request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ContainerRequestResponse {
    pub id: Uuid,
    pub establishment: String,
    pub items: Vec<RequestItemDetail>,
    pub status: String,
    pub status_detail: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub observations: Option<String>,
}

impl From<ContainerRequest> for ContainerRequestResponse {
    fn from(request: ContainerRequest) -> Self {
        Self {
            id: request.id,
            establishment: request.establishment,
            items: request.items,
            status: request.status.as_str().to_string(),
            status_detail: request.status_detail,
            requested_at: request.requested_at,
            observations: request.observations,
        }
    }
}

/// Create the requests router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_requests).post(create_request))
        .route("/:id", get(get_request).delete(delete_request))
        .route("/:id/deliver", post(deliver_request))
        .route("/summary/pending", get(pending_summary))
        .route("/summary/availability", get(availability))
}

/// List container requests, filtered and sorted newest first
#[utoipa::path(
    get,
    path = "/api/v1/requests",
    params(RequestFilters),
    responses(
        (status = 200, description = "Request list returned"),
        (status = 400, description = "Invalid filter", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "requests"
)]
pub async fn list_requests(
    State(state): State<AppState>,
    Query(filters): Query<RequestFilters>,
) -> Result<impl IntoResponse, ServiceError> {
    let requests = state.services.requests.list_requests(&filters).await?;
    let items: Vec<ContainerRequestResponse> = requests
        .into_iter()
        .map(ContainerRequestResponse::from)
        .collect();
    Ok(Json(ApiResponse::success(items)))
}

/// Create a container request
///
/// The stored status is derived by recalculation before the response is
/// built, so the caller immediately sees EN_PREPARACION or SIN_STOCK.
#[utoipa::path(
    post,
    path = "/api/v1/requests",
    request_body = NewContainerRequest,
    responses(
        (status = 201, description = "Request created", body = ContainerRequestResponse),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse)
    ),
    tag = "requests"
)]
pub async fn create_request(
    State(state): State<AppState>,
    Json(payload): Json<NewContainerRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let request = state.services.requests.create_request(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ContainerRequestResponse::from(request))),
    ))
}

/// Get a single container request
#[utoipa::path(
    get,
    path = "/api/v1/requests/{id}",
    params(("id" = Uuid, Path, description = "Request id")),
    responses(
        (status = 200, description = "Request returned", body = ContainerRequestResponse),
        (status = 404, description = "Request not found", body = crate::errors::ErrorResponse)
    ),
    tag = "requests"
)]
pub async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let request = state.services.requests.get_request(id).await?;
    Ok(Json(ApiResponse::success(ContainerRequestResponse::from(
        request,
    ))))
}

/// Delete a container request
#[utoipa::path(
    delete,
    path = "/api/v1/requests/{id}",
    params(("id" = Uuid, Path, description = "Request id")),
    responses(
        (status = 200, description = "Request deleted"),
        (status = 404, description = "Request not found", body = crate::errors::ErrorResponse)
    ),
    tag = "requests"
)]
pub async fn delete_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.requests.delete_request(id).await?;
    Ok(Json(ApiResponse::<()>::message("Request deleted")))
}

/// Mark a request as delivered
///
/// Applies the request's inventory deltas and the status flip atomically,
/// then recalculates the statuses of the remaining pending requests.
#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/deliver",
    params(("id" = Uuid, Path, description = "Request id")),
    responses(
        (status = 200, description = "Request delivered", body = crate::services::delivery::DeliveryOutcome),
        (status = 404, description = "Request not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Concurrent delivery conflict, retry", body = crate::errors::ErrorResponse)
    ),
    tag = "requests"
)]
pub async fn deliver_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let outcome = state.services.delivery.deliver_request(id).await?;
    // Delivery changed inventory; re-derive every pending status.
    state.services.requests.recalculate_and_persist().await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// Pending deliveries grouped by fraction and capacity
#[utoipa::path(
    get,
    path = "/api/v1/requests/summary/pending",
    responses(
        (status = 200, description = "Pending summary returned", body = [crate::services::requests::PendingSummaryEntry])
    ),
    tag = "requests"
)]
pub async fn pending_summary(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let summary = state.services.requests.pending_summary().await?;
    Ok(Json(ApiResponse::success(summary)))
}

/// Stock availability net of every pending ADD line
#[utoipa::path(
    get,
    path = "/api/v1/requests/summary/availability",
    responses(
        (status = 200, description = "Availability returned", body = [crate::services::requests::AvailabilityEntry])
    ),
    tag = "requests"
)]
pub async fn availability(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let entries = state.services.requests.availability().await?;
    Ok(Json(ApiResponse::success(entries)))
}
