use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A container swap request filed by an establishment.
///
/// `items` is the embedded item array (fraction, capacity, direction per
/// line); `status` holds the derived lifecycle state and is only written by
/// recalculation and the delivery reconciler.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "container_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub establishment: String,
    pub items: Json,
    pub status: String,
    pub status_detail: Option<String>,
    pub requested_at: DateTimeUtc,
    pub observations: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
