//! Delivery Reconciler
//!
//! The only component allowed to mutate inventory quantities or flip a
//! request to REALIZADO. Applies one request's inventory effect and the
//! status flip as a single transaction: both persist, or neither does.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbBackend, DbErr, EntityTrait, IsolationLevel, TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::container_request::{self, Entity as ContainerRequestEntity};
use crate::entities::inventory_item::{self, Entity as InventoryItemEntity};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::catalog::{RequestStatus, RequestType};
use crate::models::inventory::storage_key;
use crate::models::request::decode_items;

/// Result of a delivery, for API responses and the event log.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeliveryOutcome {
    pub request_id: Uuid,
    /// True when the request was already REALIZADO; the call was a no-op.
    pub already_delivered: bool,
    /// Item entries skipped because they were missing required fields.
    pub skipped_items: usize,
    /// Distinct inventory rows written.
    pub adjusted_levels: usize,
}

/// Service that marks requests delivered and reconciles inventory.
#[derive(Clone)]
pub struct DeliveryService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl DeliveryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Marks a request delivered, applying its inventory deltas atomically.
    ///
    /// Idempotent: delivering an already-REALIZADO request is a no-op
    /// success. Concurrent conflicting deliveries surface as a retryable
    /// `Conflict` with no state changed. After a successful commit the caller
    /// must re-run status recalculation over the full data set.
    #[instrument(skip(self), fields(request_id = %request_id))]
    pub async fn deliver_request(&self, request_id: Uuid) -> Result<DeliveryOutcome, ServiceError> {
        let db = &*self.db;

        // SQLite transactions are already serializable; the explicit level
        // applies to Postgres/MySQL.
        let isolation = match db.get_database_backend() {
            DbBackend::Sqlite => None,
            _ => Some(IsolationLevel::Serializable),
        };

        let outcome = db
            .transaction_with_config::<_, DeliveryOutcome, ServiceError>(
                move |txn| Box::pin(apply_delivery(txn, request_id)),
                isolation,
                None,
            )
            .await
            .map_err(map_transaction_error)?;

        if outcome.already_delivered {
            info!("request was already delivered; no inventory change");
        } else {
            info!(
                adjusted_levels = outcome.adjusted_levels,
                skipped_items = outcome.skipped_items,
                "request delivered and inventory reconciled"
            );
            if let Err(e) = self
                .event_sender
                .send(Event::RequestDelivered {
                    request_id,
                    skipped_items: outcome.skipped_items,
                })
                .await
            {
                warn!(error = %e, "failed to publish delivery event");
            }
        }

        Ok(outcome)
    }
}

/// The transactional body: all reads happen before any write (atomic-batch
/// variant), so racing deliveries on overlapping keys cannot interleave.
async fn apply_delivery(
    txn: &DatabaseTransaction,
    request_id: Uuid,
) -> Result<DeliveryOutcome, ServiceError> {
    let request = ContainerRequestEntity::find_by_id(request_id)
        .one(txn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Request {} not found", request_id)))?;

    if request.status.parse::<RequestStatus>().ok() == Some(RequestStatus::Realizado) {
        return Ok(DeliveryOutcome {
            request_id,
            already_delivered: true,
            skipped_items: 0,
            adjusted_levels: 0,
        });
    }

    // Malformed item entries are skipped, not fatal: the delivery still
    // completes and the skip count is reported.
    let (items, skipped_items) = decode_items(&request.items);
    if skipped_items > 0 {
        warn!(
            request_id = %request_id,
            skipped_items,
            "skipping malformed item entries during delivery"
        );
    }

    // Signed deltas per (fraction, capacity): ADD consumes, REMOVE returns.
    let mut deltas: Vec<((String, i32), i64)> = Vec::new();
    for item in &items {
        let change: i64 = match item.request_type {
            RequestType::Add => -1,
            RequestType::Remove => 1,
        };
        let key = (item.fraction_id.clone(), item.capacity);
        match deltas.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, delta)) => *delta += change,
            None => deltas.push((key, change)),
        }
    }
    deltas.retain(|(_, delta)| *delta != 0);

    // Read every affected row first.
    let mut rows = Vec::with_capacity(deltas.len());
    for ((fraction_id, capacity), delta) in deltas {
        let key = storage_key(&fraction_id, capacity);
        let existing = InventoryItemEntity::find_by_id(key.clone())
            .one(txn)
            .await
            .map_err(ServiceError::db_error)?;
        rows.push((key, fraction_id, capacity, delta, existing));
    }

    // Then write them all, clamping at zero; missing rows are created.
    let now = Utc::now();
    let adjusted_levels = rows.len();
    for (key, fraction_id, capacity, delta, existing) in rows {
        let current = existing.as_ref().map(|m| i64::from(m.quantity)).unwrap_or(0);
        let next = (current + delta).max(0) as i32;
        match existing {
            Some(model) => {
                let mut active: inventory_item::ActiveModel = model.into();
                active.quantity = Set(next);
                active.last_updated = Set(now);
                active.update(txn).await.map_err(ServiceError::db_error)?;
            }
            None => {
                inventory_item::ActiveModel {
                    id: Set(key),
                    fraction_id: Set(fraction_id),
                    capacity: Set(capacity),
                    quantity: Set(next),
                    last_updated: Set(now),
                    created_at: Set(now),
                }
                .insert(txn)
                .await
                .map_err(ServiceError::db_error)?;
            }
        }
    }

    let mut active: container_request::ActiveModel = request.into();
    active.status = Set(RequestStatus::Realizado.as_str().to_string());
    active.status_detail = Set(None);
    active.updated_at = Set(Some(now));
    active.update(txn).await.map_err(ServiceError::db_error)?;

    Ok(DeliveryOutcome {
        request_id,
        already_delivered: false,
        skipped_items,
        adjusted_levels,
    })
}

fn map_transaction_error(err: TransactionError<ServiceError>) -> ServiceError {
    match err {
        TransactionError::Connection(db_err) => conflict_or_database(db_err),
        TransactionError::Transaction(ServiceError::DatabaseError(db_err)) => {
            conflict_or_database(db_err)
        }
        TransactionError::Transaction(service_err) => service_err,
    }
}

/// Serialization failures and lock contention are retryable conflicts; the
/// transaction rolled back, so no state changed.
fn conflict_or_database(err: DbErr) -> ServiceError {
    let text = err.to_string();
    let retryable = text.contains("could not serialize")
        || text.contains("serialization failure")
        || text.contains("deadlock")
        || text.contains("database is locked");
    if retryable {
        ServiceError::Conflict(
            "concurrent delivery conflict; no changes were applied, retry the operation"
                .to_string(),
        )
    } else {
        ServiceError::DatabaseError(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_failures_map_to_retryable_conflict() {
        let err = conflict_or_database(DbErr::Custom(
            "ERROR: could not serialize access due to concurrent update".into(),
        ));
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn other_database_errors_pass_through() {
        let err = conflict_or_database(DbErr::Custom("relation does not exist".into()));
        assert!(matches!(err, ServiceError::DatabaseError(_)));
    }
}
