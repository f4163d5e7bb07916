//! # API Handlers
//!
//! HTTP endpoint handlers for the habits dashboard.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::dashboard::{self, page};
use crate::db;
use crate::models::ServiceInfo;
use crate::server::AppState;

pub mod logs;

/// Dashboard page: total logs, per-habit completion and the latest rows
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Dashboard page", content_type = "text/html", body = String),
        (status = 503, description = "Warehouse unavailable; page shows the error", content_type = "text/html", body = String)
    ),
    tag = "root"
)]
pub async fn root(State(state): State<AppState>) -> Response {
    let limit = state.config.dashboard_row_limit;

    let rendered = async {
        let db = state.db().await?;
        let rows = dashboard::fetch_logs(db, limit).await?;
        let total = dashboard::count_logs(db).await?;
        Ok::<_, crate::error::ApiError>(page::render(&dashboard::summarize(&rows), &rows, total))
    }
    .await;

    match rendered {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            warn!(code = %err.code, trace_id = ?err.trace_id, "Rendering dashboard error page");
            (err.status, Html(page::render_error(&err.message))).into_response()
        }
    }
}

/// Basic service information
#[utoipa::path(
    get,
    path = "/api",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Health probe payload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

/// Liveness plus warehouse reachability
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service and warehouse healthy", body = HealthResponse),
        (status = 503, description = "Warehouse unreachable", body = HealthResponse)
    ),
    tag = "root"
)]
pub async fn healthz(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let healthy = match state.db().await {
        Ok(conn) => db::health_check(conn).await.is_ok(),
        Err(_) => false,
    };

    let (status, database) = if healthy {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    (
        status,
        Json(HealthResponse {
            status: if healthy { "ok" } else { "degraded" }.to_string(),
            database: database.to_string(),
        }),
    )
}
