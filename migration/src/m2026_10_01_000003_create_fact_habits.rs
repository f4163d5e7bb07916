//! Migration to create the habit fact table.
//!
//! One row per tracked habit entry, referencing both dimensions by surrogate
//! key. `record_id` is the upstream page id.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FactHabits::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FactHabits::RecordId)
                            .text()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FactHabits::DateId).integer().not_null())
                    .col(ColumnDef::new(FactHabits::HabitId).integer().not_null())
                    .col(ColumnDef::new(FactHabits::IsCompleted).boolean().not_null())
                    .col(ColumnDef::new(FactHabits::Status).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_fact_habits_date_id")
                            .from(FactHabits::Table, FactHabits::DateId)
                            .to(DimDate::Table, DimDate::DateId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_fact_habits_habit_id")
                            .from(FactHabits::Table, FactHabits::HabitId)
                            .to(DimHabit::Table, DimHabit::HabitId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_fact_habits_date_id")
                    .table(FactHabits::Table)
                    .col(FactHabits::DateId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FactHabits::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum FactHabits {
    Table,
    RecordId,
    DateId,
    HabitId,
    IsCompleted,
    Status,
}

#[derive(DeriveIden)]
enum DimDate {
    Table,
    DateId,
}

#[derive(DeriveIden)]
enum DimHabit {
    Table,
    HabitId,
}
