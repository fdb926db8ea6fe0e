use sea_orm_migration::prelude::*;

use super::m20250301_000003_create_consignments_table::Consignments;
use super::m20250301_000005_create_invoices_table::Invoices;
use super::m20250301_000007_create_payments_table::Payments;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_consignments_status")
                    .table(Consignments::Table)
                    .col(Consignments::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_consignments_consignor_id")
                    .table(Consignments::Table)
                    .col(Consignments::ConsignorId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_consignments_consignee_id")
                    .table(Consignments::Table)
                    .col(Consignments::ConsigneeId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_consignments_is_invoiced")
                    .table(Consignments::Table)
                    .col(Consignments::IsInvoiced)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_invoices_party_id")
                    .table(Invoices::Table)
                    .col(Invoices::PartyId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_invoices_payment_status")
                    .table(Invoices::Table)
                    .col(Invoices::PaymentStatus)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payments_invoice_id")
                    .table(Payments::Table)
                    .col(Payments::InvoiceId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_payments_invoice_id")
                    .table(Payments::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_invoices_payment_status")
                    .table(Invoices::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_invoices_party_id")
                    .table(Invoices::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_consignments_is_invoiced")
                    .table(Consignments::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_consignments_consignee_id")
                    .table(Consignments::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_consignments_consignor_id")
                    .table(Consignments::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_consignments_status")
                    .table(Consignments::Table)
                    .to_owned(),
            )
            .await
    }
}
