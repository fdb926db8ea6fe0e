use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Party master record. A party can appear as consignor on one consignment
/// and consignee on another, so there is a single table for both roles.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "parties")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[validate(length(
        min = 1,
        max = 160,
        message = "Party name must be between 1 and 160 characters"
    ))]
    pub name: String,

    pub address: String,
    pub city: String,
    pub state: String,
    pub gstin: Option<String>,
    pub phone: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::invoice::Entity")]
    Invoices,
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Entity {
    /// Scoped query that excludes soft-deleted parties.
    pub fn find_active() -> Select<Entity> {
        Self::find().filter(Column::IsDeleted.eq(false))
    }
}
