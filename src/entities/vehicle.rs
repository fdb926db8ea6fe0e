use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Vehicle master record. `vehicle_number` is the registration plate and is
/// unique across the fleet.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "vehicles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[validate(length(
        min = 1,
        max = 20,
        message = "Vehicle number must be between 1 and 20 characters"
    ))]
    pub vehicle_number: String,

    pub vehicle_type: String,
    pub capacity_kg: Option<Decimal>,
    pub owner_name: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::consignment::Entity")]
    Consignments,
}

impl Related<super::consignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Consignments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Entity {
    /// Scoped query that excludes soft-deleted vehicles.
    pub fn find_active() -> Select<Entity> {
        Self::find().filter(Column::IsDeleted.eq(false))
    }
}
