//! Migration to create the date dimension table.
//!
//! `date_id` is the `YYYYMMDD` integer derived from `date`, so it is supplied
//! by the loader rather than generated by the database.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DimDate::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DimDate::DateId)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DimDate::Date).date().not_null())
                    .col(ColumnDef::new(DimDate::Year).integer().not_null())
                    .col(ColumnDef::new(DimDate::Month).integer().not_null())
                    .col(ColumnDef::new(DimDate::Day).integer().not_null())
                    .col(ColumnDef::new(DimDate::DayName).text().not_null())
                    .col(ColumnDef::new(DimDate::IsWeekend).boolean().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_dim_date_date")
                    .table(DimDate::Table)
                    .col(DimDate::Date)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DimDate::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DimDate {
    Table,
    DateId,
    Date,
    Year,
    Month,
    Day,
    DayName,
    IsWeekend,
}
