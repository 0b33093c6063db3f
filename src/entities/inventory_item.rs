use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stock of one (fraction, capacity) pair.
///
/// `id` is the composite key `"{fraction_id}-{capacity}"`; rows are created
/// lazily the first time a pair is referenced. `quantity` never goes negative.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub fraction_id: String,
    pub capacity: i32,
    pub quantity: i32,
    pub last_updated: DateTimeUtc,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
