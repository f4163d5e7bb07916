//! Test utilities shared by the integration tests.
//!
//! In-memory SQLite warehouses with migrations applied, plus builders for
//! Notion-shaped page records.

#![allow(dead_code)]

use anyhow::Result;
use habits_etl::connectors::{FetchError, FetchedRecords, RecordSource};
use habits_etl::migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use serde_json::{Value, json};
use std::sync::Mutex;

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// A Notion database page with `Habit`, `Date` and `Status` properties.
pub fn notion_page(id: &str, habit: &str, date: &str, status: &str) -> Value {
    json!({
        "object": "page",
        "id": id,
        "properties": {
            "Habit": {
                "type": "title",
                "title": [{"type": "text", "text": {"content": habit}, "plain_text": habit}]
            },
            "Date": {"type": "date", "date": {"start": date, "end": null}},
            "Status": {"type": "status", "status": {"name": status}}
        }
    })
}

/// One query response page.
pub fn query_response(results: Vec<Value>, next_cursor: Option<&str>) -> Value {
    json!({
        "object": "list",
        "results": results,
        "has_more": next_cursor.is_some(),
        "next_cursor": next_cursor,
    })
}

/// In-memory record source returning a canned fetch outcome once.
pub struct StubSource {
    outcome: Mutex<Option<FetchedRecords>>,
    pub requested_limit: Mutex<Option<Option<usize>>>,
}

impl StubSource {
    pub fn complete(records: Vec<Value>) -> Self {
        Self::with_outcome(FetchedRecords {
            pages: 1,
            records,
            interrupted: None,
        })
    }

    pub fn interrupted(records: Vec<Value>, error: FetchError) -> Self {
        Self::with_outcome(FetchedRecords {
            pages: if records.is_empty() { 0 } else { 1 },
            records,
            interrupted: Some(error),
        })
    }

    fn with_outcome(outcome: FetchedRecords) -> Self {
        Self {
            outcome: Mutex::new(Some(outcome)),
            requested_limit: Mutex::new(None),
        }
    }
}

#[async_trait::async_trait]
impl RecordSource for StubSource {
    fn name(&self) -> &str {
        "stub"
    }

    async fn fetch_all_records(&self, limit: Option<usize>) -> FetchedRecords {
        *self.requested_limit.lock().unwrap() = Some(limit);
        self.outcome.lock().unwrap().take().unwrap_or_default()
    }
}
