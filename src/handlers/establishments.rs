use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::{ApiResponse, AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct EstablishmentResponse {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateEstablishmentRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: String,
}

/// Create the establishments router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_establishments).post(create_establishment))
        .route("/:id", delete(delete_establishment))
}

/// List establishments, alphabetically
#[utoipa::path(
    get,
    path = "/api/v1/establishments",
    responses(
        (status = 200, description = "Establishment list returned", body = [EstablishmentResponse])
    ),
    tag = "establishments"
)]
pub async fn list_establishments(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let establishments = state.services.establishments.list().await?;
    let items: Vec<EstablishmentResponse> = establishments
        .into_iter()
        .map(|e| EstablishmentResponse {
            id: e.id,
            name: e.name,
            created_at: e.created_at,
        })
        .collect();
    Ok(Json(ApiResponse::success(items)))
}

/// Register an establishment
#[utoipa::path(
    post,
    path = "/api/v1/establishments",
    request_body = CreateEstablishmentRequest,
    responses(
        (status = 201, description = "Establishment created", body = EstablishmentResponse),
        (status = 400, description = "Empty or duplicate name", body = crate::errors::ErrorResponse)
    ),
    tag = "establishments"
)]
pub async fn create_establishment(
    State(state): State<AppState>,
    Json(payload): Json<CreateEstablishmentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
    let model = state.services.establishments.create(&payload.name).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(EstablishmentResponse {
            id: model.id,
            name: model.name,
            created_at: model.created_at,
        })),
    ))
}

/// Delete an establishment not referenced by any request
#[utoipa::path(
    delete,
    path = "/api/v1/establishments/{id}",
    params(("id" = Uuid, Path, description = "Establishment id")),
    responses(
        (status = 200, description = "Establishment deleted"),
        (status = 400, description = "Establishment still referenced by requests", body = crate::errors::ErrorResponse),
        (status = 404, description = "Establishment not found", body = crate::errors::ErrorResponse)
    ),
    tag = "establishments"
)]
pub async fn delete_establishment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.establishments.delete(id).await?;
    Ok(Json(ApiResponse::<()>::message("Establishment deleted")))
}
