//! # ETL Pipeline
//!
//! Fetch, normalize, transform and load, run once per invocation. Each stage
//! is a plain function call; the run is wrapped in a span carrying `run_id`.

use metrics::counter;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use thiserror::Error;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::connectors::{FetchError, RecordSource};
use crate::loader::{LoadError, WarehouseLoader};
use crate::normalization::normalize_with_report;
use crate::transform::{HabitKeyStrategy, TransformError, to_star_schema};

/// Per-run knobs, usually derived from [`AppConfig`] plus CLI flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Fetch a single page of at most this many records
    pub limit: Option<usize>,
    /// Skip the load stage
    pub dry_run: bool,
    /// Continue with the records fetched before an interrupted page
    pub allow_partial_fetch: bool,
    pub habit_keys: HabitKeyStrategy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            limit: None,
            dry_run: false,
            allow_partial_fetch: true,
            habit_keys: HabitKeyStrategy::default(),
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            limit: config.fetch_limit,
            dry_run: false,
            allow_partial_fetch: config.allow_partial_fetch,
            habit_keys: HabitKeyStrategy::from_config(config),
        }
    }
}

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub fetched: usize,
    pub normalized: usize,
    pub skipped: usize,
    pub date_rows: usize,
    pub habit_rows: usize,
    pub fact_rows: usize,
    /// False for dry runs
    pub loaded: bool,
    /// Set when the fetch stopped early and the run continued anyway
    pub fetch_interrupted: Option<String>,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("fetch failed before any records were received: {0}")]
    Fetch(#[source] FetchError),
    #[error("fetch interrupted after {fetched} records and partial runs are disabled: {source}")]
    PartialFetchRejected {
        fetched: usize,
        #[source]
        source: FetchError,
    },
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Run the whole pipeline against `source`, writing into `db`.
pub async fn run_pipeline(
    source: &dyn RecordSource,
    db: &DatabaseConnection,
    options: &PipelineOptions,
) -> Result<RunSummary, PipelineError> {
    let run_id = Uuid::new_v4();
    let span = info_span!("etl_run", %run_id, source = source.name(), dry_run = options.dry_run);

    run_stages(run_id, source, db, options)
        .instrument(span)
        .await
        .inspect_err(|err| {
            counter!("habits_etl_runs_failed_total").increment(1);
            error!(%run_id, error = %err, "ETL run failed");
        })
}

async fn run_stages(
    run_id: Uuid,
    source: &dyn RecordSource,
    db: &DatabaseConnection,
    options: &PipelineOptions,
) -> Result<RunSummary, PipelineError> {
    info!(limit = ?options.limit, "Starting ETL run");

    let fetched = source.fetch_all_records(options.limit).await;
    let fetched_count = fetched.len();
    counter!("habits_etl_records_fetched_total").increment(fetched_count as u64);

    let fetch_interrupted = match fetched.interrupted {
        None => None,
        Some(err) if fetched.records.is_empty() => return Err(PipelineError::Fetch(err)),
        Some(err) if !options.allow_partial_fetch => {
            return Err(PipelineError::PartialFetchRejected {
                fetched: fetched_count,
                source: err,
            });
        }
        Some(err) => {
            warn!(
                fetched = fetched_count,
                error = %err,
                "Continuing with a partial snapshot"
            );
            Some(err.to_string())
        }
    };
    info!(fetched = fetched_count, pages = fetched.pages, "Fetch stage complete");

    let report = normalize_with_report(&fetched.records);
    counter!("habits_etl_records_skipped_total").increment(report.skipped.len() as u64);
    info!(
        normalized = report.rows.len(),
        skipped = report.skipped.len(),
        "Normalize stage complete"
    );

    let schema = to_star_schema(&report.rows, &options.habit_keys)?;

    let loaded = if options.dry_run {
        info!("Dry run; skipping load stage");
        false
    } else {
        WarehouseLoader::new(db).load(&schema).await?;
        counter!("habits_etl_records_loaded_total").increment(schema.fact.len() as u64);
        true
    };

    let summary = RunSummary {
        run_id,
        fetched: fetched_count,
        normalized: report.rows.len(),
        skipped: report.skipped.len(),
        date_rows: schema.date_dim.len(),
        habit_rows: schema.habit_dim.len(),
        fact_rows: schema.fact.len(),
        loaded,
        fetch_interrupted,
    };

    info!(
        fetched = summary.fetched,
        facts = summary.fact_rows,
        loaded = summary.loaded,
        "ETL run complete"
    );
    counter!("habits_etl_runs_total").increment(1);

    Ok(summary)
}
