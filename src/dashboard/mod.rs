//! # Dashboard Queries
//!
//! Read-only access to the warehouse for the dashboard: the fact table joined
//! to both dimensions, plus the aggregates shown on the page.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use sea_orm::{
    DatabaseConnection, DbErr, EntityTrait, FromQueryResult, JoinType, PaginatorTrait,
    QueryOrder, QuerySelect, RelationTrait, Select,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{FactHabit, dim_date, dim_habit, fact_habit};

pub mod page;

pub const DEFAULT_LOG_LIMIT: u64 = 100;
pub const EMPTY_MESSAGE: &str = "No data found in database.";

/// One row of the joined habit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromQueryResult, ToSchema)]
pub struct HabitLogRow {
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub habit_name: String,
    pub is_completed: bool,
    pub status: String,
}

/// Per-habit completion counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HabitStat {
    pub habit_name: String,
    pub total: usize,
    pub completed: usize,
    pub completion_rate: f64,
}

/// One cell of the date x habit grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HeatmapCell {
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub habit_name: String,
    pub is_completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DashboardState {
    Empty,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DashboardSummary {
    pub state: DashboardState,
    /// Rows considered by this summary
    pub total_logs: usize,
    pub completed: usize,
    pub completion_rate: f64,
    /// Present when `state` is `empty`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub habits: Vec<HabitStat>,
    pub heatmap: Vec<HeatmapCell>,
}

fn joined_logs() -> Select<FactHabit> {
    FactHabit::find()
        .join(JoinType::InnerJoin, fact_habit::Relation::DimDate.def())
        .join(JoinType::InnerJoin, fact_habit::Relation::DimHabit.def())
}

/// Most recent log rows, newest date first, then by habit name.
pub async fn fetch_logs(db: &DatabaseConnection, limit: u64) -> Result<Vec<HabitLogRow>, DbErr> {
    joined_logs()
        .select_only()
        .column(dim_date::Column::Date)
        .column(dim_habit::Column::HabitName)
        .column(fact_habit::Column::IsCompleted)
        .column(fact_habit::Column::Status)
        .order_by_desc(dim_date::Column::Date)
        .order_by_asc(dim_habit::Column::HabitName)
        .order_by_asc(fact_habit::Column::RecordId)
        .limit(limit)
        .into_model::<HabitLogRow>()
        .all(db)
        .await
}

/// Number of fact rows reachable through both dimension joins.
pub async fn count_logs(db: &DatabaseConnection) -> Result<u64, DbErr> {
    joined_logs().count(db).await
}

fn rate(completed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64
    }
}

/// Aggregate log rows for display.
pub fn summarize(rows: &[HabitLogRow]) -> DashboardSummary {
    if rows.is_empty() {
        return DashboardSummary {
            state: DashboardState::Empty,
            total_logs: 0,
            completed: 0,
            completion_rate: 0.0,
            message: Some(EMPTY_MESSAGE.to_string()),
            habits: Vec::new(),
            heatmap: Vec::new(),
        };
    }

    let mut per_habit: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for row in rows {
        let entry = per_habit.entry(row.habit_name.as_str()).or_default();
        entry.0 += 1;
        if row.is_completed {
            entry.1 += 1;
        }
    }

    let habits = per_habit
        .into_iter()
        .map(|(name, (total, completed))| HabitStat {
            habit_name: name.to_string(),
            total,
            completed,
            completion_rate: rate(completed, total),
        })
        .collect();

    let mut heatmap: Vec<HeatmapCell> = rows
        .iter()
        .map(|row| HeatmapCell {
            date: row.date,
            habit_name: row.habit_name.clone(),
            is_completed: row.is_completed,
        })
        .collect();
    heatmap.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.habit_name.cmp(&b.habit_name)));

    let completed = rows.iter().filter(|r| r.is_completed).count();

    DashboardSummary {
        state: DashboardState::Ready,
        total_logs: rows.len(),
        completed,
        completion_rate: rate(completed, rows.len()),
        message: None,
        habits,
        heatmap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(date: &str, habit: &str, done: bool) -> HabitLogRow {
        HabitLogRow {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            habit_name: habit.to_string(),
            is_completed: done,
            status: if done { "Done" } else { "Skipped" }.to_string(),
        }
    }

    #[test]
    fn test_empty_summary() {
        let summary = summarize(&[]);
        assert_eq!(summary.state, DashboardState::Empty);
        assert_eq!(summary.message.as_deref(), Some("No data found in database."));
        assert_eq!(summary.total_logs, 0);
        assert_eq!(summary.completion_rate, 0.0);
    }

    #[test]
    fn test_summary_counts() {
        let rows = vec![
            log("2024-01-02", "Read", true),
            log("2024-01-02", "Gym", false),
            log("2024-01-01", "Read", true),
            log("2024-01-01", "Gym", true),
        ];

        let summary = summarize(&rows);

        assert_eq!(summary.state, DashboardState::Ready);
        assert_eq!(summary.total_logs, 4);
        assert_eq!(summary.completed, 3);
        assert_eq!(summary.completion_rate, 0.75);
        assert!(summary.message.is_none());

        assert_eq!(summary.habits.len(), 2);
        assert_eq!(summary.habits[0].habit_name, "Gym");
        assert_eq!(summary.habits[0].completed, 1);
        assert_eq!(summary.habits[0].completion_rate, 0.5);
        assert_eq!(summary.habits[1].habit_name, "Read");
        assert_eq!(summary.habits[1].completion_rate, 1.0);

        assert_eq!(summary.heatmap.len(), 4);
        assert_eq!(
            summary.heatmap[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert_eq!(summary.heatmap[0].habit_name, "Gym");
    }

    #[test]
    fn test_summary_serializes_state_in_snake_case() {
        let value = serde_json::to_value(summarize(&[])).unwrap();
        assert_eq!(value["state"], "empty");
        assert_eq!(value["message"], "No data found in database.");
    }
}
