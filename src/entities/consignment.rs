use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::QuerySelect;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Lifecycle status of a consignment.
///
/// The stored string values double as the display values printed on
/// goods receipts, so they carry spaces rather than camel case.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ConsignmentStatus {
    #[sea_orm(string_value = "Booked")]
    Booked,
    #[sea_orm(string_value = "Loaded")]
    Loaded,
    #[sea_orm(string_value = "In Transit")]
    #[serde(rename = "In Transit")]
    #[strum(serialize = "In Transit")]
    InTransit,
    #[sea_orm(string_value = "Delivered")]
    Delivered,
    #[sea_orm(string_value = "Settled")]
    Settled,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

impl ConsignmentStatus {
    /// Terminal statuses accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConsignmentStatus::Settled | ConsignmentStatus::Cancelled
        )
    }
}

/// Consignment record, one per goods receipt (GR).
///
/// Monetary columns are denormalized at write time: `total_amount` and
/// `amount_in_words` are recomputed by the service layer whenever any charge
/// component changes, never by the database.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "consignments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[validate(length(
        min = 1,
        max = 20,
        message = "GR number must be between 1 and 20 characters"
    ))]
    pub gr_number: String,

    pub gr_date: NaiveDate,
    pub consignor_id: Uuid,
    pub consignee_id: Uuid,
    pub vehicle_id: Uuid,
    pub origin: String,
    pub destination: String,
    pub weight_kg: Decimal,
    pub quantity: i32,
    pub description: Option<String>,
    pub freight_amount: Decimal,
    pub surcharge: Decimal,
    pub other_charges: Decimal,
    pub gr_charge: Decimal,
    pub total_amount: Decimal,
    pub amount_in_words: String,
    pub status: ConsignmentStatus,
    pub booked_at: DateTime<Utc>,
    pub loaded_at: Option<DateTime<Utc>>,
    pub in_transit_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub settled_at: Option<DateTime<Utc>>,
    pub is_invoiced: bool,
    pub invoice_id: Option<Uuid>,
    pub remarks: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::party::Entity",
        from = "Column::ConsignorId",
        to = "super::party::Column::Id"
    )]
    Consignor,
    #[sea_orm(
        belongs_to = "super::party::Entity",
        from = "Column::ConsigneeId",
        to = "super::party::Column::Id"
    )]
    Consignee,
    #[sea_orm(
        belongs_to = "super::vehicle::Entity",
        from = "Column::VehicleId",
        to = "super::vehicle::Column::Id"
    )]
    Vehicle,
    #[sea_orm(has_many = "super::consignment_status_history::Entity")]
    StatusHistory,
}

impl Related<super::vehicle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vehicle.def()
    }
}

impl Related<super::consignment_status_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Route string as it appears on printed documents.
    pub fn route(&self) -> String {
        format!("{} - {}", self.origin, self.destination)
    }
}

impl Entity {
    /// Scoped query that excludes soft-deleted consignments.
    pub fn find_active() -> Select<Entity> {
        Self::find().filter(Column::IsDeleted.eq(false))
    }

    /// Same scope with `FOR UPDATE` row locks held until the caller's
    /// transaction ends. The lock clause is a no-op on SQLite.
    pub fn find_active_for_update() -> Select<Entity> {
        Self::find_active().lock_exclusive()
    }
}
