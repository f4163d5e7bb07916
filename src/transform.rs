//! Star-schema transformation.
//!
//! Turns flat rows into a date dimension, a habit dimension and a fact table
//! keyed by the dimensions' surrogate keys. Pure and deterministic for a
//! given input order.

use std::collections::{HashMap, hash_map::Entry};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::normalization::{FlatRow, SUPPORTED_YEARS};

/// How habit surrogate keys are assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HabitKeyStrategy {
    /// First-seen order, `offset`, `offset + 1`, ... Renumbers when the habit
    /// set or its order changes between runs.
    Sequential { offset: i32 },
    /// Derived from a SHA-256 of the habit name; stable across runs.
    Hashed,
}

impl Default for HabitKeyStrategy {
    fn default() -> Self {
        HabitKeyStrategy::Sequential {
            offset: DEFAULT_HABIT_KEY_OFFSET,
        }
    }
}

impl HabitKeyStrategy {
    pub fn from_config(config: &AppConfig) -> Self {
        match config.habit_key_strategy.as_str() {
            "hashed" => HabitKeyStrategy::Hashed,
            _ => HabitKeyStrategy::Sequential {
                offset: config.habit_key_offset,
            },
        }
    }
}

pub const DEFAULT_HABIT_KEY_OFFSET: i32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateDimRow {
    pub date_id: i32,
    pub date: NaiveDate,
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub day_name: String,
    pub is_weekend: bool,
}

impl DateDimRow {
    pub fn from_date(date: NaiveDate) -> Result<Self, TransformError> {
        let weekday = date.weekday();
        Ok(Self {
            date_id: date_id(date).ok_or(TransformError::DateOutOfRange { date })?,
            date,
            year: date.year(),
            month: date.month() as i32,
            day: date.day() as i32,
            day_name: day_name(weekday).to_string(),
            is_weekend: matches!(weekday, Weekday::Sat | Weekday::Sun),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitDimRow {
    pub habit_id: i32,
    pub habit_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactRow {
    pub record_id: String,
    pub date_id: i32,
    pub habit_id: i32,
    pub is_completed: bool,
    pub status_label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StarSchema {
    pub date_dim: Vec<DateDimRow>,
    pub habit_dim: Vec<HabitDimRow>,
    pub fact: Vec<FactRow>,
}

/// Invariant violations detected while building or checking a star schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("fact row '{record_id}' references date_id {date_id} missing from the date dimension")]
    DanglingDateKey { record_id: String, date_id: i32 },
    #[error("fact row '{record_id}' references habit_id {habit_id} missing from the habit dimension")]
    DanglingHabitKey { record_id: String, habit_id: i32 },
    #[error("habits '{first}' and '{second}' hash to the same habit_id {habit_id}")]
    HabitKeyCollision {
        habit_id: i32,
        first: String,
        second: String,
    },
    #[error("habit key sequence overflowed at offset {offset}")]
    HabitKeyOverflow { offset: i32 },
    #[error("date {date} has no YYYYMMDD key; years must be 1..=9999")]
    DateOutOfRange { date: NaiveDate },
}

/// `YYYYMMDD` as an integer, or `None` for years outside [`SUPPORTED_YEARS`].
pub fn date_id(date: NaiveDate) -> Option<i32> {
    if !SUPPORTED_YEARS.contains(&date.year()) {
        return None;
    }
    Some(date.year() * 10_000 + date.month() as i32 * 100 + date.day() as i32)
}

fn day_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Content-addressed habit key: the first four bytes of SHA-256(name) as a
/// non-negative `i32`.
pub fn hashed_habit_id(habit_name: &str) -> i32 {
    let digest = Sha256::digest(habit_name.as_bytes());
    let bytes = [digest[0], digest[1], digest[2], digest[3]];
    (u32::from_be_bytes(bytes) & 0x7fff_ffff) as i32
}

/// Build the star schema for one run.
pub fn to_star_schema(
    rows: &[FlatRow],
    strategy: &HabitKeyStrategy,
) -> Result<StarSchema, TransformError> {
    let mut schema = StarSchema::default();

    let mut date_keys: HashMap<NaiveDate, i32> = HashMap::new();
    for row in rows {
        if let Entry::Vacant(slot) = date_keys.entry(row.date) {
            let dim = DateDimRow::from_date(row.date).inspect_err(|err| {
                error!(record_id = %row.record_id, error = %err, "Date cannot be keyed");
            })?;
            slot.insert(dim.date_id);
            schema.date_dim.push(dim);
        }
    }

    let mut habit_keys: HashMap<&str, i32> = HashMap::new();
    let mut habit_names_by_id: HashMap<i32, &str> = HashMap::new();
    for row in rows {
        let name = row.habit_name.as_str();
        if habit_keys.contains_key(name) {
            continue;
        }

        let habit_id = match strategy {
            HabitKeyStrategy::Sequential { offset } => {
                let position = i32::try_from(schema.habit_dim.len())
                    .map_err(|_| TransformError::HabitKeyOverflow { offset: *offset })?;
                offset
                    .checked_add(position)
                    .ok_or(TransformError::HabitKeyOverflow { offset: *offset })?
            }
            HabitKeyStrategy::Hashed => hashed_habit_id(name),
        };

        if let Some(existing) = habit_names_by_id.insert(habit_id, name) {
            let err = TransformError::HabitKeyCollision {
                habit_id,
                first: existing.to_string(),
                second: name.to_string(),
            };
            error!(error = %err, "Habit key collision");
            return Err(err);
        }

        habit_keys.insert(name, habit_id);
        schema.habit_dim.push(HabitDimRow {
            habit_id,
            habit_name: name.to_string(),
        });
    }

    for row in rows {
        let date_id = *date_keys.get(&row.date).ok_or_else(|| {
            let err = TransformError::DanglingDateKey {
                record_id: row.record_id.clone(),
                date_id: date_id(row.date).unwrap_or_default(),
            };
            error!(error = %err, "Fact row failed to join the date dimension");
            err
        })?;
        let habit_id = *habit_keys.get(row.habit_name.as_str()).ok_or_else(|| {
            let err = TransformError::DanglingHabitKey {
                record_id: row.record_id.clone(),
                habit_id: -1,
            };
            error!(error = %err, "Fact row failed to join the habit dimension");
            err
        })?;

        schema.fact.push(FactRow {
            record_id: row.record_id.clone(),
            date_id,
            habit_id,
            is_completed: row.is_completed,
            status_label: row.status_label.clone(),
        });
    }

    info!(
        dates = schema.date_dim.len(),
        habits = schema.habit_dim.len(),
        facts = schema.fact.len(),
        "Built star schema"
    );

    Ok(schema)
}

impl StarSchema {
    /// Verify that every fact row references existing dimension keys.
    pub fn check_integrity(&self) -> Result<(), TransformError> {
        let date_ids: std::collections::HashSet<i32> =
            self.date_dim.iter().map(|d| d.date_id).collect();
        let habit_ids: std::collections::HashSet<i32> =
            self.habit_dim.iter().map(|h| h.habit_id).collect();

        for fact in &self.fact {
            if !date_ids.contains(&fact.date_id) {
                return Err(TransformError::DanglingDateKey {
                    record_id: fact.record_id.clone(),
                    date_id: fact.date_id,
                });
            }
            if !habit_ids.contains(&fact.habit_id) {
                return Err(TransformError::DanglingHabitKey {
                    record_id: fact.record_id.clone(),
                    habit_id: fact.habit_id,
                });
            }
        }

        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.fact.is_empty()
    }
}
