use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Consignments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Consignments::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Consignments::GrNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Consignments::GrDate).date().not_null())
                    .col(ColumnDef::new(Consignments::ConsignorId).uuid().not_null())
                    .col(ColumnDef::new(Consignments::ConsigneeId).uuid().not_null())
                    .col(ColumnDef::new(Consignments::VehicleId).uuid().not_null())
                    .col(ColumnDef::new(Consignments::Origin).string().not_null())
                    .col(ColumnDef::new(Consignments::Destination).string().not_null())
                    .col(ColumnDef::new(Consignments::WeightKg).decimal().not_null())
                    .col(
                        ColumnDef::new(Consignments::Quantity)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Consignments::Description).text().null())
                    .col(
                        ColumnDef::new(Consignments::FreightAmount)
                            .decimal()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Consignments::Surcharge)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Consignments::OtherCharges)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Consignments::GrCharge)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Consignments::TotalAmount)
                            .decimal()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Consignments::AmountInWords)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Consignments::Status).string().not_null())
                    .col(
                        ColumnDef::new(Consignments::BookedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Consignments::LoadedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Consignments::InTransitAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Consignments::DeliveredAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Consignments::SettledAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Consignments::IsInvoiced)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Consignments::InvoiceId).uuid().null())
                    .col(ColumnDef::new(Consignments::Remarks).text().null())
                    .col(
                        ColumnDef::new(Consignments::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Consignments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Consignments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_consignments_consignor_id")
                            .from(Consignments::Table, Consignments::ConsignorId)
                            .to(
                                super::m20250301_000001_create_parties_table::Parties::Table,
                                super::m20250301_000001_create_parties_table::Parties::Id,
                            ),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_consignments_consignee_id")
                            .from(Consignments::Table, Consignments::ConsigneeId)
                            .to(
                                super::m20250301_000001_create_parties_table::Parties::Table,
                                super::m20250301_000001_create_parties_table::Parties::Id,
                            ),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_consignments_vehicle_id")
                            .from(Consignments::Table, Consignments::VehicleId)
                            .to(
                                super::m20250301_000002_create_vehicles_table::Vehicles::Table,
                                super::m20250301_000002_create_vehicles_table::Vehicles::Id,
                            ),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Consignments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Consignments {
    Table,
    Id,
    GrNumber,
    GrDate,
    ConsignorId,
    ConsigneeId,
    VehicleId,
    Origin,
    Destination,
    WeightKg,
    Quantity,
    Description,
    FreightAmount,
    Surcharge,
    OtherCharges,
    GrCharge,
    TotalAmount,
    AmountInWords,
    Status,
    BookedAt,
    LoadedAt,
    InTransitAt,
    DeliveredAt,
    SettledAt,
    IsInvoiced,
    InvoiceId,
    Remarks,
    IsDeleted,
    CreatedAt,
    UpdatedAt,
}
