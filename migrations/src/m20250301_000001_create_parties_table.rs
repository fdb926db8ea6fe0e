use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Parties::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Parties::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Parties::Name).string().not_null())
                    .col(ColumnDef::new(Parties::Address).string().not_null())
                    .col(ColumnDef::new(Parties::City).string().not_null())
                    .col(ColumnDef::new(Parties::State).string().not_null())
                    .col(ColumnDef::new(Parties::Gstin).string().null())
                    .col(ColumnDef::new(Parties::Phone).string().null())
                    .col(
                        ColumnDef::new(Parties::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Parties::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Parties::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Parties::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Parties {
    Table,
    Id,
    Name,
    Address,
    City,
    State,
    Gstin,
    Phone,
    IsDeleted,
    CreatedAt,
    UpdatedAt,
}
