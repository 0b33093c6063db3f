//! Inventory service: direct stock edits and listing.
//!
//! Delivery reconciliation is deliberately elsewhere (`delivery`); this
//! service only covers operator-driven level edits. Callers are expected to
//! re-run status recalculation after a successful edit.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection, EntityTrait};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::entities::inventory_item::{self, Entity as InventoryItemEntity};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::catalog::Fraction;
use crate::models::inventory::{storage_key, InventoryLevel};

/// Input for setting one (fraction, capacity) stock level.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpsertInventoryLevel {
    pub fraction_id: String,
    pub capacity: i32,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i32,
}

#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl InventoryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Lists all known stock levels, ordered by fraction then capacity.
    #[instrument(skip(self))]
    pub async fn list_levels(&self) -> Result<Vec<InventoryLevel>, ServiceError> {
        let db = &*self.db;
        let mut levels: Vec<InventoryLevel> = InventoryItemEntity::find()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(InventoryLevel::from)
            .collect();
        levels.sort_by(|a, b| {
            a.fraction_id
                .cmp(&b.fraction_id)
                .then(a.capacity.cmp(&b.capacity))
        });
        Ok(levels)
    }

    /// Sets the stock level for a (fraction, capacity) pair, creating the row
    /// on first reference.
    #[instrument(skip(self, input), fields(fraction_id = %input.fraction_id, capacity = input.capacity))]
    pub async fn set_level(
        &self,
        input: UpsertInventoryLevel,
    ) -> Result<InventoryLevel, ServiceError> {
        input.validate()?;
        let fraction = input.fraction_id.parse::<Fraction>().map_err(|_| {
            ServiceError::ValidationError(format!("Unknown fraction: {}", input.fraction_id))
        })?;
        if !fraction.allows_capacity(input.capacity) {
            return Err(ServiceError::ValidationError(format!(
                "Capacity {}L is not available for fraction {}",
                input.capacity,
                fraction.display_name()
            )));
        }

        let db = &*self.db;
        let now = Utc::now();
        let key = storage_key(&input.fraction_id, input.capacity);

        let existing = InventoryItemEntity::find_by_id(key.clone())
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;

        let model = match existing {
            Some(model) => {
                let mut active: inventory_item::ActiveModel = model.into();
                active.quantity = Set(input.quantity);
                active.last_updated = Set(now);
                active.update(db).await.map_err(ServiceError::db_error)?
            }
            None => {
                inventory_item::ActiveModel {
                    id: Set(key),
                    fraction_id: Set(input.fraction_id.clone()),
                    capacity: Set(input.capacity),
                    quantity: Set(input.quantity),
                    last_updated: Set(now),
                    created_at: Set(now),
                }
                .insert(db)
                .await
                .map_err(ServiceError::db_error)?
            }
        };

        info!(new_quantity = model.quantity, "inventory level set");
        if let Err(e) = self
            .event_sender
            .send(Event::InventoryAdjusted {
                fraction_id: model.fraction_id.clone(),
                capacity: model.capacity,
                new_quantity: model.quantity,
            })
            .await
        {
            warn!(error = %e, "failed to publish inventory-adjusted event");
        }

        Ok(InventoryLevel::from(model))
    }
}
