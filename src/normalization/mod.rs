//! Record normalization.
//!
//! Flattens raw Notion pages into [`FlatRow`]s. A malformed record is dropped
//! with a diagnostic; it never fails the batch.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, NaiveDate};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

pub const HABIT_FIELD: &str = "Habit";
pub const DATE_FIELD: &str = "Date";
pub const STATUS_FIELD: &str = "Status";

/// Status label that marks an entry as completed.
pub const COMPLETED_STATUS: &str = "Done";

/// Calendar years a date may carry; `date_id` is `YYYYMMDD` with four year digits.
pub const SUPPORTED_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

/// Placeholder used when a title is present but has no text.
pub const UNTITLED: &str = "Untitled";

/// One habit entry, flattened from a raw record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatRow {
    pub record_id: String,
    pub habit_name: String,
    pub date: NaiveDate,
    pub status_label: String,
    pub is_completed: bool,
}

/// Why a raw record was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("record has no string id")]
    MissingId,
    #[error("missing field '{field}'")]
    MissingField { field: &'static str },
    #[error("field '{field}' has unexpected shape: expected {expected}")]
    ShapeMismatch {
        field: &'static str,
        expected: &'static str,
    },
    #[error("field '{field}' has no value")]
    EmptyValue { field: &'static str },
    #[error("field 'Date' is not a valid date: '{value}'")]
    InvalidDate { value: String },
    #[error("record id already seen in this batch")]
    DuplicateId,
}

/// A dropped record and the reason it was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Position in the input batch
    pub index: usize,
    pub record_id: Option<String>,
    pub reason: NormalizeError,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizeReport {
    pub rows: Vec<FlatRow>,
    pub skipped: Vec<SkippedRecord>,
}

/// Normalize a batch of raw records, keeping input order.
pub fn normalize(records: &[Value]) -> Vec<FlatRow> {
    normalize_with_report(records).rows
}

/// Normalize a batch and report every dropped record.
pub fn normalize_with_report(records: &[Value]) -> NormalizeReport {
    let mut report = NormalizeReport::default();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for (index, record) in records.iter().enumerate() {
        let record_id = record.get("id").and_then(Value::as_str).map(str::to_owned);

        let outcome = normalize_record(record).and_then(|row| {
            if seen_ids.insert(row.record_id.clone()) {
                Ok(row)
            } else {
                Err(NormalizeError::DuplicateId)
            }
        });

        match outcome {
            Ok(row) => report.rows.push(row),
            Err(reason) => {
                warn!(
                    index,
                    record_id = record_id.as_deref().unwrap_or("<none>"),
                    reason = %reason,
                    "Skipping record"
                );
                report.skipped.push(SkippedRecord {
                    index,
                    record_id,
                    reason,
                });
            }
        }
    }

    info!(
        input = records.len(),
        rows = report.rows.len(),
        skipped = report.skipped.len(),
        "Normalized records"
    );

    report
}

/// Normalize a single raw record.
pub fn normalize_record(record: &Value) -> Result<FlatRow, NormalizeError> {
    let object = record.as_object().ok_or(NormalizeError::NotAnObject)?;

    let record_id = object
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or(NormalizeError::MissingId)?
        .to_string();

    let properties = object
        .get("properties")
        .ok_or(NormalizeError::MissingField {
            field: "properties",
        })?
        .as_object()
        .ok_or(NormalizeError::ShapeMismatch {
            field: "properties",
            expected: "object",
        })?;

    let habit_name = extract_title(property(properties, HABIT_FIELD)?)?;
    let date = extract_date(property(properties, DATE_FIELD)?)?;
    let status_label = extract_status(property(properties, STATUS_FIELD)?)?;
    let is_completed = status_label == COMPLETED_STATUS;

    Ok(FlatRow {
        record_id,
        habit_name,
        date,
        status_label,
        is_completed,
    })
}

fn property<'a>(
    properties: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a Value, NormalizeError> {
    properties
        .get(field)
        .ok_or(NormalizeError::MissingField { field })
}

fn extract_title(property: &Value) -> Result<String, NormalizeError> {
    let segments = property
        .get("title")
        .and_then(Value::as_array)
        .ok_or(NormalizeError::ShapeMismatch {
            field: HABIT_FIELD,
            expected: "title list",
        })?;

    let text: String = segments.iter().filter_map(segment_text).collect();
    let text = text.trim();

    if text.is_empty() {
        Ok(UNTITLED.to_string())
    } else {
        Ok(text.to_string())
    }
}

fn segment_text(segment: &Value) -> Option<&str> {
    segment
        .get("plain_text")
        .and_then(Value::as_str)
        .or_else(|| {
            segment
                .get("text")
                .and_then(|text| text.get("content"))
                .and_then(Value::as_str)
        })
}

fn extract_date(property: &Value) -> Result<NaiveDate, NormalizeError> {
    let date = match property.get("date") {
        None => {
            return Err(NormalizeError::ShapeMismatch {
                field: DATE_FIELD,
                expected: "date object",
            });
        }
        Some(Value::Null) => return Err(NormalizeError::EmptyValue { field: DATE_FIELD }),
        Some(date) => date,
    };

    let start = date
        .get("start")
        .and_then(Value::as_str)
        .ok_or(NormalizeError::ShapeMismatch {
            field: DATE_FIELD,
            expected: "date.start string",
        })?;

    parse_date(start).ok_or_else(|| NormalizeError::InvalidDate {
        value: start.to_string(),
    })
}

/// Parse `YYYY-MM-DD`, or an RFC 3339 datetime taken at its own offset.
///
/// Years outside [`SUPPORTED_YEARS`] are rejected; chrono's `%Y` would
/// otherwise accept signed and five-digit years.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .filter(|date| SUPPORTED_YEARS.contains(&date.year()))
}

fn extract_status(property: &Value) -> Result<String, NormalizeError> {
    // Status columns created as plain selects carry the label under `select`.
    let label = match property.get("status").or_else(|| property.get("select")) {
        None => {
            return Err(NormalizeError::ShapeMismatch {
                field: STATUS_FIELD,
                expected: "status object",
            });
        }
        Some(Value::Null) => {
            return Err(NormalizeError::EmptyValue {
                field: STATUS_FIELD,
            });
        }
        Some(label) => label,
    };

    label
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or(NormalizeError::ShapeMismatch {
            field: STATUS_FIELD,
            expected: "status.name string",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(id: &str, habit: &str, date: &str, status: &str) -> Value {
        json!({
            "object": "page",
            "id": id,
            "properties": {
                "Habit": {"type": "title", "title": [{"type": "text", "plain_text": habit, "text": {"content": habit}}]},
                "Date": {"type": "date", "date": {"start": date, "end": null}},
                "Status": {"type": "status", "status": {"name": status, "color": "green"}}
            }
        })
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_valid_records_flatten() {
        let rows = normalize(&[
            page("a", "Read", "2024-01-01", "Done"),
            page("b", "Gym", "2024-01-01", "Skipped"),
        ]);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].record_id, "a");
        assert_eq!(rows[0].habit_name, "Read");
        assert_eq!(rows[0].date, ymd(2024, 1, 1));
        assert_eq!(rows[0].status_label, "Done");
        assert_eq!(
            rows.iter().map(|r| r.is_completed).collect::<Vec<_>>(),
            vec![true, false]
        );
    }

    #[test]
    fn test_completion_is_exact_label_match() {
        let rows = normalize(&[
            page("a", "Read", "2024-01-01", "done"),
            page("b", "Read", "2024-01-02", "Done "),
        ]);
        assert!(rows.iter().all(|r| !r.is_completed));
    }

    #[test]
    fn test_missing_field_drops_only_that_record() {
        let mut broken = page("b", "Gym", "2024-01-02", "Done");
        broken["properties"]
            .as_object_mut()
            .unwrap()
            .remove("Status");

        let report = normalize_with_report(&[
            page("a", "Read", "2024-01-01", "Done"),
            broken,
            page("c", "Walk", "2024-01-03", "Done"),
        ]);

        let ids: Vec<_> = report.rows.iter().map(|r| r.record_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].index, 1);
        assert_eq!(report.skipped[0].record_id.as_deref(), Some("b"));
        assert_eq!(
            report.skipped[0].reason,
            NormalizeError::MissingField {
                field: STATUS_FIELD
            }
        );
    }

    #[test]
    fn test_shape_mismatch_is_reported() {
        let mut record = page("a", "Read", "2024-01-01", "Done");
        record["properties"]["Habit"] = json!({"type": "rich_text", "rich_text": []});

        assert_eq!(
            normalize_record(&record),
            Err(NormalizeError::ShapeMismatch {
                field: HABIT_FIELD,
                expected: "title list"
            })
        );
    }

    #[test]
    fn test_empty_title_becomes_untitled() {
        let mut record = page("a", "Read", "2024-01-01", "Done");
        record["properties"]["Habit"]["title"] = json!([]);

        let row = normalize_record(&record).unwrap();
        assert_eq!(row.habit_name, UNTITLED);
    }

    #[test]
    fn test_title_segments_are_joined() {
        let mut record = page("a", "Read", "2024-01-01", "Done");
        record["properties"]["Habit"]["title"] = json!([
            {"plain_text": "Morning "},
            {"text": {"content": "Run"}}
        ]);

        assert_eq!(normalize_record(&record).unwrap().habit_name, "Morning Run");
    }

    #[test]
    fn test_invalid_date_is_skipped() {
        let report = normalize_with_report(&[page("a", "Read", "2024-13-45", "Done")]);
        assert!(report.rows.is_empty());
        assert_eq!(
            report.skipped[0].reason,
            NormalizeError::InvalidDate {
                value: "2024-13-45".to_string()
            }
        );
    }

    #[test]
    fn test_out_of_range_years_are_skipped() {
        for value in ["+250000-01-01", "-0001-01-01", "0000-06-15", "+10000-01-01"] {
            let report = normalize_with_report(&[page("a", "Read", value, "Done")]);
            assert!(report.rows.is_empty(), "{value}");
            assert_eq!(
                report.skipped[0].reason,
                NormalizeError::InvalidDate {
                    value: value.to_string()
                }
            );
        }

        let edges = normalize(&[
            page("a", "Read", "0001-01-01", "Done"),
            page("b", "Read", "9999-12-31", "Done"),
        ]);
        assert_eq!(edges.len(), 2);
    }

    #[test]
    fn test_null_date_is_skipped() {
        let mut record = page("a", "Read", "2024-01-01", "Done");
        record["properties"]["Date"]["date"] = Value::Null;
        assert_eq!(
            normalize_record(&record),
            Err(NormalizeError::EmptyValue { field: DATE_FIELD })
        );
    }

    #[test]
    fn test_datetime_uses_its_own_offset() {
        let row = normalize_record(&page("a", "Read", "2024-03-10T23:30:00.000-05:00", "Done"))
            .unwrap();
        assert_eq!(row.date, ymd(2024, 3, 10));
    }

    #[test]
    fn test_select_status_accepted() {
        let mut record = page("a", "Read", "2024-01-01", "Done");
        record["properties"]["Status"] = json!({"type": "select", "select": {"name": "Done"}});
        assert!(normalize_record(&record).unwrap().is_completed);
    }

    #[test]
    fn test_missing_id_and_non_object() {
        let mut record = page("a", "Read", "2024-01-01", "Done");
        record.as_object_mut().unwrap().remove("id");
        assert_eq!(normalize_record(&record), Err(NormalizeError::MissingId));
        assert_eq!(
            normalize_record(&json!("not a page")),
            Err(NormalizeError::NotAnObject)
        );
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let report = normalize_with_report(&[
            page("a", "Read", "2024-01-01", "Done"),
            page("a", "Gym", "2024-01-02", "Done"),
        ]);
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].habit_name, "Read");
        assert_eq!(report.skipped[0].reason, NormalizeError::DuplicateId);
    }

    #[test]
    fn test_empty_batch() {
        assert!(normalize(&[]).is_empty());
    }
}
