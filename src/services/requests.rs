//! Container request service.
//!
//! Owns request CRUD and `recalculate_and_persist`, the step every mutation
//! ends with: re-derive the status of all non-delivered requests from the
//! current inventory snapshot and write back whatever changed. Statuses are
//! never patched incrementally.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::entities::container_request::{self, Entity as ContainerRequestEntity};
use crate::entities::inventory_item::Entity as InventoryItemEntity;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::catalog::{Fraction, RequestStatus, RequestType};
use crate::models::inventory::InventoryLevel;
use crate::models::request::{encode_items, ContainerRequest, RequestItemDetail};
use crate::services::allocation;

/// Input for creating a request.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewContainerRequest {
    #[validate(length(min = 1, message = "Establishment is required"))]
    pub establishment: String,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<RequestItemDetail>,
    /// Defaults to now; accepted explicitly so imported requests keep their
    /// original priority date.
    pub requested_at: Option<DateTime<Utc>>,
    pub observations: Option<String>,
}

/// Optional filters for request listing.
#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RequestFilters {
    pub establishment: Option<String>,
    pub status: Option<String>,
    pub fraction_id: Option<String>,
    pub capacity: Option<i32>,
}

/// One row of the pending-deliveries summary: how many ADD lines per
/// (fraction, capacity) sit in each pending state.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PendingSummaryEntry {
    pub fraction_id: String,
    pub fraction_name: String,
    pub capacity: i32,
    pub en_preparacion: i64,
    pub sin_stock: i64,
}

/// Projected availability: stock minus one unit per pending ADD line,
/// whether or not that line is currently satisfiable. Can go negative.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AvailabilityEntry {
    pub fraction_id: String,
    pub capacity: i32,
    pub available: i64,
}

#[derive(Clone)]
pub struct RequestService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl RequestService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Creates a request with a provisional EN_PREPARACION status, then runs
    /// recalculation so the stored status is derived, not provisional.
    #[instrument(skip(self, input), fields(establishment = %input.establishment))]
    pub async fn create_request(
        &self,
        input: NewContainerRequest,
    ) -> Result<ContainerRequest, ServiceError> {
        input.validate()?;
        let establishment = input.establishment.trim().to_string();
        if establishment.is_empty() {
            return Err(ServiceError::ValidationError(
                "Establishment is required".to_string(),
            ));
        }
        validate_items_against_catalog(&input.items)?;

        let db = &*self.db;
        let now = Utc::now();
        let id = Uuid::new_v4();

        container_request::ActiveModel {
            id: Set(id),
            establishment: Set(establishment),
            items: Set(encode_items(&input.items)),
            status: Set(RequestStatus::EnPreparacion.as_str().to_string()),
            status_detail: Set(None),
            requested_at: Set(input.requested_at.unwrap_or(now)),
            observations: Set(input.observations),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(db)
        .await
        .map_err(ServiceError::db_error)?;

        if let Err(e) = self.event_sender.send(Event::RequestCreated(id)).await {
            warn!(error = %e, "failed to publish request-created event");
        }

        let recalculated = self.recalculate_and_persist().await?;
        recalculated
            .into_iter()
            .find(|request| request.id == id)
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "request {} missing after recalculation",
                    id
                ))
            })
    }

    /// Lists requests for display: filtered, newest first.
    #[instrument(skip(self))]
    pub async fn list_requests(
        &self,
        filters: &RequestFilters,
    ) -> Result<Vec<ContainerRequest>, ServiceError> {
        let status_filter = filters
            .status
            .as_deref()
            .map(|status| {
                status.parse::<RequestStatus>().map_err(|_| {
                    ServiceError::ValidationError(format!("Unknown status filter: {}", status))
                })
            })
            .transpose()?;

        let db = &*self.db;
        let models = ContainerRequestEntity::find()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let mut requests: Vec<ContainerRequest> = models
            .into_iter()
            .map(ContainerRequest::from_entity)
            .collect();

        if let Some(establishment) = &filters.establishment {
            requests.retain(|request| &request.establishment == establishment);
        }
        if let Some(status) = status_filter {
            requests.retain(|request| request.status == status);
        }
        if let Some(fraction_id) = &filters.fraction_id {
            requests.retain(|request| {
                request
                    .items
                    .iter()
                    .any(|item| &item.fraction_id == fraction_id)
            });
        }
        if let Some(capacity) = filters.capacity {
            requests.retain(|request| request.items.iter().any(|item| item.capacity == capacity));
        }

        requests.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        Ok(requests)
    }

    #[instrument(skip(self), fields(request_id = %id))]
    pub async fn get_request(&self, id: Uuid) -> Result<ContainerRequest, ServiceError> {
        let db = &*self.db;
        let model = ContainerRequestEntity::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Request {} not found", id)))?;
        Ok(ContainerRequest::from_entity(model))
    }

    /// Deletes a request, then recalculates: removing a pending claim can
    /// unblock later requests.
    #[instrument(skip(self), fields(request_id = %id))]
    pub async fn delete_request(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db;
        let result = ContainerRequestEntity::delete_by_id(id)
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Request {} not found", id)));
        }

        if let Err(e) = self.event_sender.send(Event::RequestDeleted(id)).await {
            warn!(error = %e, "failed to publish request-deleted event");
        }

        self.recalculate_and_persist().await?;
        Ok(())
    }

    /// Loads the full snapshot, runs the allocation engine, and writes back
    /// every pending request whose (status, detail) changed. Returns the
    /// annotated set.
    #[instrument(skip(self))]
    pub async fn recalculate_and_persist(&self) -> Result<Vec<ContainerRequest>, ServiceError> {
        let db = &*self.db;

        let request_models = ContainerRequestEntity::find()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        let inventory: Vec<InventoryLevel> = InventoryItemEntity::find()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(InventoryLevel::from)
            .collect();

        let requests: Vec<ContainerRequest> = request_models
            .into_iter()
            .map(ContainerRequest::from_entity)
            .collect();
        let before: HashMap<Uuid, (RequestStatus, Option<String>)> = requests
            .iter()
            .map(|request| (request.id, (request.status, request.status_detail.clone())))
            .collect();

        let recalculated = allocation::recalculate_statuses(&requests, &inventory);

        let mut changed = 0usize;
        for request in &recalculated {
            // REALIZADO is terminal and owned by the delivery reconciler.
            if request.status == RequestStatus::Realizado {
                continue;
            }
            let Some((old_status, old_detail)) = before.get(&request.id) else {
                continue;
            };
            if *old_status == request.status && *old_detail == request.status_detail {
                continue;
            }
            container_request::ActiveModel {
                id: Set(request.id),
                status: Set(request.status.as_str().to_string()),
                status_detail: Set(request.status_detail.clone()),
                updated_at: Set(Some(Utc::now())),
                ..Default::default()
            }
            .update(db)
            .await
            .map_err(ServiceError::db_error)?;
            changed += 1;
        }

        debug!(total = recalculated.len(), changed, "statuses recalculated");
        Ok(recalculated)
    }

    /// Pending-deliveries summary, grouped per (fraction, capacity) and
    /// sorted by fraction name then capacity. Unknown fractions are skipped.
    #[instrument(skip(self))]
    pub async fn pending_summary(&self) -> Result<Vec<PendingSummaryEntry>, ServiceError> {
        let db = &*self.db;
        let models = ContainerRequestEntity::find()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let mut summary: Vec<PendingSummaryEntry> = Vec::new();
        for request in models.into_iter().map(ContainerRequest::from_entity) {
            if request.status == RequestStatus::Realizado {
                continue;
            }
            for item in &request.items {
                if item.request_type != RequestType::Add {
                    continue;
                }
                let Ok(fraction) = item.fraction_id.parse::<Fraction>() else {
                    continue;
                };
                let index = summary
                    .iter()
                    .position(|e| e.fraction_id == item.fraction_id && e.capacity == item.capacity)
                    .unwrap_or_else(|| {
                        summary.push(PendingSummaryEntry {
                            fraction_id: item.fraction_id.clone(),
                            fraction_name: fraction.display_name().to_string(),
                            capacity: item.capacity,
                            en_preparacion: 0,
                            sin_stock: 0,
                        });
                        summary.len() - 1
                    });
                if request.status == RequestStatus::EnPreparacion {
                    summary[index].en_preparacion += 1;
                } else {
                    summary[index].sin_stock += 1;
                }
            }
        }

        summary.sort_by(|a, b| {
            a.fraction_name
                .cmp(&b.fraction_name)
                .then(a.capacity.cmp(&b.capacity))
        });
        Ok(summary)
    }

    /// Real-time availability: stock minus every pending ADD line.
    #[instrument(skip(self))]
    pub async fn availability(&self) -> Result<Vec<AvailabilityEntry>, ServiceError> {
        let db = &*self.db;

        let mut available: HashMap<(String, i32), i64> = HashMap::new();
        for level in InventoryItemEntity::find()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
        {
            available.insert(
                (level.fraction_id.clone(), level.capacity),
                i64::from(level.quantity),
            );
        }

        let models = ContainerRequestEntity::find()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        for request in models.into_iter().map(ContainerRequest::from_entity) {
            if request.status == RequestStatus::Realizado {
                continue;
            }
            for item in &request.items {
                if item.request_type == RequestType::Add {
                    *available
                        .entry((item.fraction_id.clone(), item.capacity))
                        .or_insert(0) -= 1;
                }
            }
        }

        let mut entries: Vec<AvailabilityEntry> = available
            .into_iter()
            .map(|((fraction_id, capacity), available)| AvailabilityEntry {
                fraction_id,
                capacity,
                available,
            })
            .collect();
        entries.sort_by(|a, b| {
            a.fraction_id
                .cmp(&b.fraction_id)
                .then(a.capacity.cmp(&b.capacity))
        });
        Ok(entries)
    }
}

fn validate_items_against_catalog(items: &[RequestItemDetail]) -> Result<(), ServiceError> {
    for item in items {
        let fraction = item.fraction_id.parse::<Fraction>().map_err(|_| {
            ServiceError::ValidationError(format!("Unknown fraction: {}", item.fraction_id))
        })?;
        if !fraction.allows_capacity(item.capacity) {
            return Err(ServiceError::ValidationError(format!(
                "Capacity {}L is not available for fraction {}",
                item.capacity,
                fraction.display_name()
            )));
        }
    }
    Ok(())
}
