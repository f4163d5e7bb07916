//! Database migrations for the habits warehouse.
//!
//! Creates the star-schema tables the ETL loads and the dashboard reads:
//! `dim_date`, `dim_habit` and `fact_habits`.

pub use sea_orm_migration::prelude::*;

mod m2026_10_01_000001_create_dim_date;
mod m2026_10_01_000002_create_dim_habit;
mod m2026_10_01_000003_create_fact_habits;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_10_01_000001_create_dim_date::Migration),
            Box::new(m2026_10_01_000002_create_dim_habit::Migration),
            Box::new(m2026_10_01_000003_create_fact_habits::Migration),
        ]
    }
}
