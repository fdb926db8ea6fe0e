use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::QuerySelect;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Settlement state of an invoice, derived from paid amount and due date.
/// Never set directly by callers; the payment service recomputes it on every
/// payment, reversal, and approved amendment.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Partial")]
    Partial,
    #[sea_orm(string_value = "Paid")]
    Paid,
    #[sea_orm(string_value = "Overdue")]
    Overdue,
}

/// Invoice header. Party name, address and GSTIN are snapshotted at creation
/// so later edits to the party master do not rewrite issued invoices.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub party_id: Uuid,
    pub party_name: String,
    pub party_address: String,
    pub party_gstin: Option<String>,
    pub subtotal: Decimal,
    pub gr_charge: Decimal,
    pub total_amount: Decimal,
    pub amount_in_words: String,
    pub paid_amount: Decimal,
    pub balance_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::party::Entity",
        from = "Column::PartyId",
        to = "super::party::Column::Id"
    )]
    Party,
    #[sea_orm(has_many = "super::invoice_item::Entity")]
    Items,
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::party::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Party.def()
    }
}

impl Related<super::invoice_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Entity {
    /// Scoped query that excludes soft-deleted invoices.
    pub fn find_active() -> Select<Entity> {
        Self::find().filter(Column::IsDeleted.eq(false))
    }

    /// Same scope with `FOR UPDATE` row locks held until the caller's
    /// transaction ends. The lock clause is a no-op on SQLite.
    pub fn find_active_for_update() -> Select<Entity> {
        Self::find_active().lock_exclusive()
    }
}
