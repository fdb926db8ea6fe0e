use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::QuerySelect;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mode of payment as recorded on the receipt.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum PaymentMode {
    #[sea_orm(string_value = "Cash")]
    Cash,
    #[sea_orm(string_value = "Cheque")]
    Cheque,
    #[sea_orm(string_value = "Bank Transfer")]
    #[serde(rename = "Bank Transfer")]
    #[strum(serialize = "Bank Transfer")]
    BankTransfer,
    #[sea_orm(string_value = "UPI")]
    #[serde(rename = "UPI")]
    #[strum(serialize = "UPI")]
    Upi,
    #[sea_orm(string_value = "Other")]
    Other,
}

/// Payment receipt. Exactly one of `invoice_id` and `party_id` is set:
/// invoice payments settle a specific invoice, party payments are unapplied
/// credit held against the party.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub payment_number: String,
    pub invoice_id: Option<Uuid>,
    pub party_id: Option<Uuid>,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_mode: PaymentMode,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub is_deleted: bool,
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
    #[sea_orm(
        belongs_to = "super::party::Entity",
        from = "Column::PartyId",
        to = "super::party::Column::Id"
    )]
    Party,
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoice.def()
    }
}

impl Related<super::party::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Party.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Entity {
    /// Scoped query that excludes reversed (soft-deleted) payments.
    pub fn find_active() -> Select<Entity> {
        Self::find().filter(Column::IsDeleted.eq(false))
    }

    /// Same scope with `FOR UPDATE` row locks held until the caller's
    /// transaction ends. The lock clause is a no-op on SQLite.
    pub fn find_active_for_update() -> Select<Entity> {
        Self::find_active().lock_exclusive()
    }
}
