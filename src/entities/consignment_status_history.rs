use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::consignment::ConsignmentStatus;

/// Append-only record of a single status transition. `from_status` is NULL
/// exactly once per consignment, for the booking row.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "consignment_status_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub consignment_id: Uuid,
    pub from_status: Option<ConsignmentStatus>,
    pub to_status: ConsignmentStatus,
    pub remarks: Option<String>,
    pub changed_by: Uuid,
    pub changed_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::consignment::Entity",
        from = "Column::ConsignmentId",
        to = "super::consignment::Column::Id"
    )]
    Consignment,
}

impl Related<super::consignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Consignment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
