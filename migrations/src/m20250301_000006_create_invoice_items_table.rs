use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InvoiceItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InvoiceItems::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InvoiceItems::InvoiceId).uuid().not_null())
                    .col(
                        ColumnDef::new(InvoiceItems::ConsignmentId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InvoiceItems::GrNumber).string().not_null())
                    .col(ColumnDef::new(InvoiceItems::GrDate).date().not_null())
                    .col(
                        ColumnDef::new(InvoiceItems::VehicleNumber)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InvoiceItems::Route).string().not_null())
                    .col(
                        ColumnDef::new(InvoiceItems::Quantity)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(InvoiceItems::Rate).decimal().not_null())
                    .col(ColumnDef::new(InvoiceItems::Amount).decimal().not_null())
                    .col(
                        ColumnDef::new(InvoiceItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_invoice_items_invoice_id")
                            .from(InvoiceItems::Table, InvoiceItems::InvoiceId)
                            .to(
                                super::m20250301_000005_create_invoices_table::Invoices::Table,
                                super::m20250301_000005_create_invoices_table::Invoices::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InvoiceItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum InvoiceItems {
    Table,
    Id,
    InvoiceId,
    ConsignmentId,
    GrNumber,
    GrDate,
    VehicleNumber,
    Route,
    Quantity,
    Rate,
    Amount,
    CreatedAt,
}
