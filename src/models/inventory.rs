use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::inventory_item;

/// Storage key for one inventory row. The primary key of the inventory table
/// is this string, so delivery can address affected rows directly by id.
pub fn storage_key(fraction_id: &str, capacity: i32) -> String {
    format!("{}-{}", fraction_id, capacity)
}

/// Stock of one (fraction, capacity) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InventoryLevel {
    pub fraction_id: String,
    pub capacity: i32,
    pub quantity: i32,
    pub last_updated: DateTime<Utc>,
}

impl InventoryLevel {
    pub fn storage_key(&self) -> String {
        storage_key(&self.fraction_id, self.capacity)
    }
}

impl From<inventory_item::Model> for InventoryLevel {
    fn from(model: inventory_item::Model) -> Self {
        Self {
            fraction_id: model.fraction_id,
            capacity: model.capacity,
            quantity: model.quantity,
            last_updated: model.last_updated,
        }
    }
}
