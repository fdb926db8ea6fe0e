use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of change an audit row records.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum AuditAction {
    #[sea_orm(string_value = "Create")]
    Create,
    #[sea_orm(string_value = "Update")]
    Update,
    #[sea_orm(string_value = "Delete")]
    Delete,
    #[sea_orm(string_value = "Status Change")]
    #[serde(rename = "Status Change")]
    #[strum(serialize = "Status Change")]
    StatusChange,
    #[sea_orm(string_value = "Approve")]
    Approve,
    #[sea_orm(string_value = "Reject")]
    Reject,
    #[sea_orm(string_value = "Reverse")]
    Reverse,
}

/// Append-only audit trail row. `old_values`/`new_values` hold JSON
/// snapshots serialized to text; they are never read back by the
/// application, only by operators.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub table_name: String,
    pub record_id: String,
    pub action: AuditAction,
    pub old_values: Option<String>,
    pub new_values: Option<String>,
    pub actor_id: Uuid,
    pub request_meta: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
