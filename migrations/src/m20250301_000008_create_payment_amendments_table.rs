use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PaymentAmendments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentAmendments::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PaymentAmendments::InvoiceId).uuid().null())
                    .col(
                        ColumnDef::new(PaymentAmendments::ConsignmentId)
                            .uuid()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PaymentAmendments::AmendmentType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentAmendments::Amount)
                            .decimal()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentAmendments::Reason)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentAmendments::ProposedBy)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PaymentAmendments::ApprovedBy).uuid().null())
                    .col(
                        ColumnDef::new(PaymentAmendments::ApprovedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PaymentAmendments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_amendments_invoice_id")
                            .from(PaymentAmendments::Table, PaymentAmendments::InvoiceId)
                            .to(
                                super::m20250301_000005_create_invoices_table::Invoices::Table,
                                super::m20250301_000005_create_invoices_table::Invoices::Id,
                            ),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_amendments_consignment_id")
                            .from(PaymentAmendments::Table, PaymentAmendments::ConsignmentId)
                            .to(
                                super::m20250301_000003_create_consignments_table::Consignments::Table,
                                super::m20250301_000003_create_consignments_table::Consignments::Id,
                            ),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PaymentAmendments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum PaymentAmendments {
    Table,
    Id,
    InvoiceId,
    ConsignmentId,
    AmendmentType,
    Amount,
    Reason,
    ProposedBy,
    ApprovedBy,
    ApprovedAt,
    CreatedAt,
}
