//! # Warehouse Loader
//!
//! Replaces the contents of the star-schema tables with one run's output.
//! The delete and every insert share a single transaction, so readers see
//! either the previous run or the new one.

use sea_orm::{ActiveValue::Set, DatabaseConnection, DbErr, EntityTrait, TransactionTrait};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::models::{DimDate, DimHabit, FactHabit, dim_date, dim_habit, fact_habit};
use crate::transform::{StarSchema, TransformError};

/// Rows per `INSERT` statement. Keeps bind parameter counts under driver limits.
pub const INSERT_CHUNK_SIZE: usize = 500;

const DATE_TABLE: &str = "dim_date";
const HABIT_TABLE: &str = "dim_habit";
const FACT_TABLE: &str = "fact_habits";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("refusing to load inconsistent star schema: {0}")]
    Integrity(#[from] TransformError),
    #[error("failed to write table '{table}': {source}")]
    Database {
        table: &'static str,
        #[source]
        source: DbErr,
    },
    #[error("transaction failed: {0}")]
    Transaction(#[source] DbErr),
}

impl LoadError {
    fn table(table: &'static str) -> impl FnOnce(DbErr) -> LoadError {
        move |source| LoadError::Database { table, source }
    }
}

/// Row counts written by one load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub date_rows: usize,
    pub habit_rows: usize,
    pub fact_rows: usize,
    /// Fact rows removed from the previous run
    pub replaced_facts: u64,
}

/// Writes star schemas into the warehouse.
pub struct WarehouseLoader<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> WarehouseLoader<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Replace all three tables with `schema`.
    ///
    /// Foreign keys dictate the order: facts are deleted first and inserted
    /// last. Any failure rolls the whole load back.
    #[instrument(skip_all, fields(dates = schema.date_dim.len(), habits = schema.habit_dim.len(), facts = schema.fact.len()))]
    pub async fn load(&self, schema: &StarSchema) -> Result<LoadSummary, LoadError> {
        schema.check_integrity()?;

        let txn = self.db.begin().await.map_err(LoadError::Transaction)?;

        let replaced_facts = FactHabit::delete_many()
            .exec(&txn)
            .await
            .map_err(LoadError::table(FACT_TABLE))?
            .rows_affected;
        DimHabit::delete_many()
            .exec(&txn)
            .await
            .map_err(LoadError::table(HABIT_TABLE))?;
        DimDate::delete_many()
            .exec(&txn)
            .await
            .map_err(LoadError::table(DATE_TABLE))?;
        debug!(replaced_facts, "Cleared warehouse tables");

        for chunk in schema.date_dim.chunks(INSERT_CHUNK_SIZE) {
            let rows = chunk.iter().map(|row| dim_date::ActiveModel {
                date_id: Set(row.date_id),
                date: Set(row.date),
                year: Set(row.year),
                month: Set(row.month),
                day: Set(row.day),
                day_name: Set(row.day_name.clone()),
                is_weekend: Set(row.is_weekend),
            });
            DimDate::insert_many(rows)
                .exec_without_returning(&txn)
                .await
                .map_err(LoadError::table(DATE_TABLE))?;
        }

        for chunk in schema.habit_dim.chunks(INSERT_CHUNK_SIZE) {
            let rows = chunk.iter().map(|row| dim_habit::ActiveModel {
                habit_id: Set(row.habit_id),
                habit_name: Set(row.habit_name.clone()),
            });
            DimHabit::insert_many(rows)
                .exec_without_returning(&txn)
                .await
                .map_err(LoadError::table(HABIT_TABLE))?;
        }

        for chunk in schema.fact.chunks(INSERT_CHUNK_SIZE) {
            let rows = chunk.iter().map(|row| fact_habit::ActiveModel {
                record_id: Set(row.record_id.clone()),
                date_id: Set(row.date_id),
                habit_id: Set(row.habit_id),
                is_completed: Set(row.is_completed),
                status: Set(row.status_label.clone()),
            });
            FactHabit::insert_many(rows)
                .exec_without_returning(&txn)
                .await
                .map_err(LoadError::table(FACT_TABLE))?;
        }

        txn.commit().await.map_err(LoadError::Transaction)?;

        let summary = LoadSummary {
            date_rows: schema.date_dim.len(),
            habit_rows: schema.habit_dim.len(),
            fact_rows: schema.fact.len(),
            replaced_facts,
        };

        info!(
            table = DATE_TABLE,
            rows = summary.date_rows,
            "Loaded table"
        );
        info!(
            table = HABIT_TABLE,
            rows = summary.habit_rows,
            "Loaded table"
        );
        info!(
            table = FACT_TABLE,
            rows = summary.fact_rows,
            "Loaded table"
        );

        Ok(summary)
    }
}
