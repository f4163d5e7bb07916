//! Habit log endpoints.

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::config::MAX_DASHBOARD_ROW_LIMIT;
use crate::dashboard::{self, DashboardSummary, HabitLogRow};
use crate::error::{ApiError, validation_error};
use crate::server::AppState;

/// Query parameters for listing logs
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LogsQuery {
    /// Maximum rows to return (1..=1000). Defaults to the configured row limit.
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LogsResponse {
    pub logs: Vec<HabitLogRow>,
    /// Total fact rows in the warehouse
    pub total: u64,
}

fn resolve_limit(requested: Option<u64>, default: u64) -> Result<u64, ApiError> {
    match requested {
        None => Ok(default),
        Some(limit) if (1..=MAX_DASHBOARD_ROW_LIMIT).contains(&limit) => Ok(limit),
        Some(limit) => Err(validation_error(
            "limit must be between 1 and 1000",
            json!({ "limit": limit }),
        )),
    }
}

/// Most recent habit logs, newest first
#[utoipa::path(
    get,
    path = "/api/logs",
    params(LogsQuery),
    responses(
        (status = 200, description = "Habit logs", body = LogsResponse),
        (status = 400, description = "Invalid limit", body = ApiError, example = json!({
            "code": "VALIDATION_FAILED",
            "message": "limit must be between 1 and 1000",
            "details": {"limit": 0},
            "trace_id": "corr-12345678"
        })),
        (status = 503, description = "Warehouse unavailable", body = ApiError)
    ),
    tag = "logs"
)]
pub async fn list_logs(
    State(state): State<AppState>,
    query: Result<Query<LogsQuery>, QueryRejection>,
) -> Result<Json<LogsResponse>, ApiError> {
    let Query(query) = query?;
    let limit = resolve_limit(query.limit, state.config.dashboard_row_limit)?;

    let db = state.db().await?;
    let logs = dashboard::fetch_logs(db, limit).await?;
    let total = dashboard::count_logs(db).await?;

    Ok(Json(LogsResponse { logs, total }))
}

/// Aggregates over the most recent logs
#[utoipa::path(
    get,
    path = "/api/summary",
    params(LogsQuery),
    responses(
        (status = 200, description = "Dashboard summary", body = DashboardSummary),
        (status = 400, description = "Invalid limit", body = ApiError),
        (status = 503, description = "Warehouse unavailable", body = ApiError)
    ),
    tag = "logs"
)]
pub async fn get_summary(
    State(state): State<AppState>,
    query: Result<Query<LogsQuery>, QueryRejection>,
) -> Result<Json<DashboardSummary>, ApiError> {
    let Query(query) = query?;
    let limit = resolve_limit(query.limit, state.config.dashboard_row_limit)?;

    let db = state.db().await?;
    let rows = dashboard::fetch_logs(db, limit).await?;

    Ok(Json(dashboard::summarize(&rows)))
}
