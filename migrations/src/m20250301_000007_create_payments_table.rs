use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Payments::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Payments::PaymentNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Payments::InvoiceId).uuid().null())
                    .col(ColumnDef::new(Payments::PartyId).uuid().null())
                    .col(ColumnDef::new(Payments::Amount).decimal().not_null())
                    .col(ColumnDef::new(Payments::PaymentDate).date().not_null())
                    .col(ColumnDef::new(Payments::PaymentMode).string().not_null())
                    .col(ColumnDef::new(Payments::ReferenceNumber).string().null())
                    .col(ColumnDef::new(Payments::Notes).string().null())
                    .col(
                        ColumnDef::new(Payments::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Payments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_invoice_id")
                            .from(Payments::Table, Payments::InvoiceId)
                            .to(
                                super::m20250301_000005_create_invoices_table::Invoices::Table,
                                super::m20250301_000005_create_invoices_table::Invoices::Id,
                            ),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_party_id")
                            .from(Payments::Table, Payments::PartyId)
                            .to(
                                super::m20250301_000001_create_parties_table::Parties::Table,
                                super::m20250301_000001_create_parties_table::Parties::Id,
                            ),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Payments {
    Table,
    Id,
    PaymentNumber,
    InvoiceId,
    PartyId,
    Amount,
    PaymentDate,
    PaymentMode,
    ReferenceNumber,
    Notes,
    IsDeleted,
    CreatedAt,
}
