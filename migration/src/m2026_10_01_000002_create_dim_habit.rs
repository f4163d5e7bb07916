//! Migration to create the habit dimension table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DimHabit::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DimHabit::HabitId)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DimHabit::HabitName).text().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DimHabit::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DimHabit {
    Table,
    HabitId,
    HabitName,
}
