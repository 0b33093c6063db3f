use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Wasteflow API",
        version = "0.3.0",
        description = r#"
# Wasteflow — waste-container request & inventory API

Tracks container swap requests filed by municipal establishments and the
container inventory pool that fulfills them.

## How statuses work

Request statuses are derived, not stored truth: after every mutation the
allocation engine re-derives the status of every non-delivered request from
the current inventory snapshot, oldest request first. Allocation is
all-or-nothing per request. Marking a request delivered applies its inventory
effect exactly once, inside a single transaction.

## Error handling

Errors use a consistent response format with appropriate HTTP status codes;
409 means a concurrent delivery conflict and is safe to retry.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        crate::handlers::requests::list_requests,
        crate::handlers::requests::create_request,
        crate::handlers::requests::get_request,
        crate::handlers::requests::delete_request,
        crate::handlers::requests::deliver_request,
        crate::handlers::requests::pending_summary,
        crate::handlers::requests::availability,
        crate::handlers::inventory::list_inventory,
        crate::handlers::inventory::upsert_inventory,
        crate::handlers::establishments::list_establishments,
        crate::handlers::establishments::create_establishment,
        crate::handlers::establishments::delete_establishment,
        crate::handlers::health::health_check,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::models::catalog::RequestType,
        crate::models::request::RequestItemDetail,
        crate::models::inventory::InventoryLevel,
        crate::services::requests::NewContainerRequest,
        crate::services::requests::PendingSummaryEntry,
        crate::services::requests::AvailabilityEntry,
        crate::services::inventory::UpsertInventoryLevel,
        crate::services::delivery::DeliveryOutcome,
        crate::handlers::requests::ContainerRequestResponse,
        crate::handlers::establishments::EstablishmentResponse,
        crate::handlers::establishments::CreateEstablishmentRequest,
    )),
    tags(
        (name = "requests", description = "Container request management and delivery"),
        (name = "inventory", description = "Container stock levels"),
        (name = "establishments", description = "Establishment maintenance"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

/// Swagger UI mounted at `/docs`, serving the spec at `/api-docs/openapi.json`.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
