//! Date dimension entity (`dim_date`).

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "dim_date")]
pub struct Model {
    /// `YYYYMMDD` integer derived from `date`
    #[sea_orm(primary_key, auto_increment = false)]
    pub date_id: i32,
    pub date: Date,
    pub year: i32,
    pub month: i32,
    pub day: i32,
    /// English weekday name, e.g. "Monday"
    pub day_name: String,
    pub is_weekend: bool,
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
