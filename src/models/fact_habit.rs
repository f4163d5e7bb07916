//! Habit fact entity (`fact_habits`)
//!
//! One row per tracked entry. `record_id` is the upstream page id; the two
//! foreign keys point at surrogate keys produced by the same ETL run.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "fact_habits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub record_id: String,
    pub date_id: i32,
    pub habit_id: i32,
    pub is_completed: bool,
    /// Raw status label as entered upstream
    pub status: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::dim_date::Entity",
        from = "Column::DateId",
        to = "super::dim_date::Column::DateId"
    )]
    DimDate,
    #[sea_orm(
        belongs_to = "super::dim_habit::Entity",
        from = "Column::HabitId",
        to = "super::dim_habit::Column::HabitId"
    )]
    DimHabit,
}

impl Related<super::dim_date::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DimDate.def()
    }
}

impl Related<super::dim_habit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DimHabit.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
