use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ConsignmentStatusHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ConsignmentStatusHistory::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConsignmentStatusHistory::ConsignmentId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConsignmentStatusHistory::FromStatus)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ConsignmentStatusHistory::ToStatus)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConsignmentStatusHistory::Remarks)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ConsignmentStatusHistory::ChangedBy)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConsignmentStatusHistory::ChangedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_consignment_status_history_consignment_id")
                            .from(
                                ConsignmentStatusHistory::Table,
                                ConsignmentStatusHistory::ConsignmentId,
                            )
                            .to(
                                super::m20250301_000003_create_consignments_table::Consignments::Table,
                                super::m20250301_000003_create_consignments_table::Consignments::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(ConsignmentStatusHistory::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
pub enum ConsignmentStatusHistory {
    Table,
    Id,
    ConsignmentId,
    FromStatus,
    ToStatus,
    Remarks,
    ChangedBy,
    ChangedAt,
}
