//! Habit dimension entity (`dim_habit`).

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "dim_habit")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub habit_id: i32,
    pub habit_name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::fact_habit::Entity")]
    FactHabit,
}

impl Related<super::fact_habit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FactHabit.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
