use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Invoices::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Invoices::Id).uuid().primary_key().not_null())
                    .col(
                        ColumnDef::new(Invoices::InvoiceNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Invoices::InvoiceDate).date().not_null())
                    .col(ColumnDef::new(Invoices::DueDate).date().not_null())
                    .col(ColumnDef::new(Invoices::PartyId).uuid().not_null())
                    .col(ColumnDef::new(Invoices::PartyName).string().not_null())
                    .col(ColumnDef::new(Invoices::PartyAddress).string().not_null())
                    .col(ColumnDef::new(Invoices::PartyGstin).string().null())
                    .col(ColumnDef::new(Invoices::Subtotal).decimal().not_null())
                    .col(
                        ColumnDef::new(Invoices::GrCharge)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Invoices::TotalAmount).decimal().not_null())
                    .col(ColumnDef::new(Invoices::AmountInWords).string().not_null())
                    .col(
                        ColumnDef::new(Invoices::PaidAmount)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Invoices::BalanceAmount)
                            .decimal()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Invoices::PaymentStatus)
                            .string()
                            .not_null()
                            .default("Pending"),
                    )
                    .col(ColumnDef::new(Invoices::Notes).text().null())
                    .col(
                        ColumnDef::new(Invoices::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Invoices::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Invoices::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Invoices::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Invoices {
    Table,
    Id,
    InvoiceNumber,
    InvoiceDate,
    DueDate,
    PartyId,
    PartyName,
    PartyAddress,
    PartyGstin,
    Subtotal,
    GrCharge,
    TotalAmount,
    AmountInWords,
    PaidAmount,
    BalanceAmount,
    PaymentStatus,
    Notes,
    IsDeleted,
    CreatedAt,
    UpdatedAt,
}
