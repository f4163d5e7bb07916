//! # Server Configuration
//!
//! Router, shared state and OpenAPI document for the dashboard service.

use std::sync::Arc;

use axum::{Router, http::Method, routing::get};
use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::db;
use crate::error::ApiError;
use crate::handlers;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Warehouse pool, opened on first use so the page can report an
    /// unreachable database instead of the process failing at startup.
    pub db: Arc<OnceCell<DatabaseConnection>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
            db: Arc::new(OnceCell::new()),
        }
    }

    /// State with an already-open connection.
    pub fn with_connection(config: AppConfig, db: DatabaseConnection) -> Self {
        Self {
            config: Arc::new(config),
            db: Arc::new(OnceCell::new_with(Some(db))),
        }
    }

    /// The warehouse connection, connecting on first call.
    ///
    /// A failed attempt leaves the cell empty so the next request retries.
    pub async fn db(&self) -> Result<&DatabaseConnection, ApiError> {
        self.db
            .get_or_try_init(|| db::connect(&self.config))
            .await
            .map_err(ApiError::from)
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/api", get(handlers::service_info))
        .route("/api/logs", get(handlers::logs::list_logs))
        .route("/api/summary", get(handlers::logs::get_summary))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET]),
        )
        .layer(TraceLayer::new_for_http())
}

/// Starts the dashboard server and serves until the process is stopped.
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let addr = config
        .bind_addr()
        .map_err(|e| anyhow::anyhow!("Invalid dashboard bind address: {}", e))?;
    let profile = config.profile.clone();

    let app = create_app(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, %profile, "Dashboard listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::service_info,
        crate::handlers::healthz,
        crate::handlers::logs::list_logs,
        crate::handlers::logs::get_summary,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::handlers::HealthResponse,
            crate::handlers::logs::LogsResponse,
            crate::dashboard::HabitLogRow,
            crate::dashboard::DashboardSummary,
            crate::dashboard::DashboardState,
            crate::dashboard::HabitStat,
            crate::dashboard::HeatmapCell,
            crate::error::ApiError,
        )
    ),
    tags(
        (name = "root", description = "Service metadata and health"),
        (name = "logs", description = "Habit log queries"),
    ),
    info(
        title = "Habits Dashboard API",
        description = "Read-only views over the habits warehouse",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
