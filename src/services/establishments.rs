//! Establishment maintenance.
//!
//! Names are unique case-insensitively, and an establishment cannot be
//! deleted while requests still reference it. Renaming is out of scope.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::entities::container_request::{self, Entity as ContainerRequestEntity};
use crate::entities::establishment::{self, Entity as EstablishmentEntity};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Clone)]
pub struct EstablishmentService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl EstablishmentService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<establishment::Model>, ServiceError> {
        let db = &*self.db;
        EstablishmentEntity::find()
            .order_by_asc(establishment::Column::Name)
            .all(db)
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn create(&self, name: &str) -> Result<establishment::Model, ServiceError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ServiceError::ValidationError(
                "Establishment name cannot be empty".to_string(),
            ));
        }

        let db = &*self.db;
        let existing = EstablishmentEntity::find()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        if existing
            .iter()
            .any(|e| e.name.eq_ignore_ascii_case(trimmed))
        {
            return Err(ServiceError::ValidationError(format!(
                "Establishment '{}' already exists",
                trimmed
            )));
        }

        let model = establishment::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(trimmed.to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
        .map_err(ServiceError::db_error)?;

        info!(establishment_id = %model.id, name = %model.name, "establishment created");
        if let Err(e) = self
            .event_sender
            .send(Event::EstablishmentCreated(model.id))
            .await
        {
            warn!(error = %e, "failed to publish establishment-created event");
        }

        Ok(model)
    }

    /// Deletes an establishment unless any request still references it.
    #[instrument(skip(self), fields(establishment_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db;
        let model = EstablishmentEntity::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Establishment {} not found", id)))?;

        let in_use = ContainerRequestEntity::find()
            .filter(container_request::Column::Establishment.eq(model.name.clone()))
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;
        if in_use > 0 {
            return Err(ServiceError::InvalidOperation(format!(
                "Cannot delete '{}': it is referenced by {} request(s); delete or modify those first",
                model.name, in_use
            )));
        }

        EstablishmentEntity::delete_by_id(id)
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;

        info!(name = %model.name, "establishment deleted");
        if let Err(e) = self.event_sender.send(Event::EstablishmentDeleted(id)).await {
            warn!(error = %e, "failed to publish establishment-deleted event");
        }

        Ok(())
    }
}
