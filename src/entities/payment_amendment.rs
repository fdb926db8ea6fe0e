use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::QuerySelect;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of monetary amendment proposed against an invoice or consignment.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum AmendmentType {
    #[sea_orm(string_value = "Additional Charge")]
    #[serde(rename = "Additional Charge")]
    #[strum(serialize = "Additional Charge")]
    AdditionalCharge,
    #[sea_orm(string_value = "Discount")]
    Discount,
    #[sea_orm(string_value = "Correction")]
    Correction,
}

/// Proposed monetary amendment. Immutable once written; approval stamps
/// `approved_by`/`approved_at`, rejection deletes the row. `approved_at`
/// doubles as the exactly-once guard for applying the amendment.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_amendments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub invoice_id: Option<Uuid>,
    pub consignment_id: Option<Uuid>,
    pub amendment_type: AmendmentType,
    pub amount: Decimal,
    pub reason: String,
    pub proposed_by: Uuid,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::invoice::Entity",
        from = "Column::InvoiceId",
        to = "super::invoice::Column::Id"
    )]
    Invoice,
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoice.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// An amendment is applied at most once, keyed on the approval stamp.
    pub fn is_approved(&self) -> bool {
        self.approved_at.is_some()
    }
}

impl Entity {
    /// Fetch with `FOR UPDATE` row locks held until the caller's transaction
    /// ends. The lock clause is a no-op on SQLite.
    pub fn find_for_update() -> Select<Entity> {
        Self::find().lock_exclusive()
    }
}
