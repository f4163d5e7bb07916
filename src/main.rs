//! # habits-etl
//!
//! Pulls the habit database from Notion and replaces the warehouse star
//! schema with the result. Exits non-zero when the run fails.

use anyhow::{Context, Result};
use clap::Parser;
use habits_etl::{
    config::{AppConfig, ConfigLoader},
    connectors::NotionClient,
    db,
    migration::{Migrator, MigratorTrait},
    pipeline::{PipelineOptions, run_pipeline},
    telemetry,
};
use sea_orm::DatabaseConnection;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "habits-etl", version, about = "Load Notion habit logs into the warehouse")]
struct Args {
    /// Fetch a single page of at most N records (1..=100)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=100))]
    limit: Option<u64>,

    /// Fetch, normalize and transform without writing to the warehouse
    #[arg(long)]
    dry_run: bool,

    /// Skip applying pending schema migrations before loading
    #[arg(long, env = "HABITS_SKIP_MIGRATIONS")]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ConfigLoader::new().load().context("loading configuration")?;
    telemetry::init_tracing(&config).context("initializing tracing")?;

    if let Ok(redacted_json) = config.redacted_json() {
        info!(profile = %config.profile, config = %redacted_json, "Loaded configuration");
    }

    let source = NotionClient::from_config(&config).context("configuring Notion client")?;

    let db = open_warehouse(&config, &args).await?;

    let mut options = PipelineOptions::from_config(&config);
    if let Some(limit) = args.limit {
        options.limit = Some(limit as usize);
    }
    options.dry_run = args.dry_run;

    let summary = run_pipeline(&source, &db, &options)
        .await
        .context("ETL run failed")?;

    info!(
        run_id = %summary.run_id,
        fetched = summary.fetched,
        skipped = summary.skipped,
        facts = summary.fact_rows,
        loaded = summary.loaded,
        "Finished"
    );

    Ok(())
}

/// Connect and migrate the warehouse. A dry run never touches it, so no pool
/// is opened.
async fn open_warehouse(config: &AppConfig, args: &Args) -> Result<DatabaseConnection> {
    if args.dry_run {
        info!("Dry run; not connecting to the warehouse");
        return Ok(DatabaseConnection::Disconnected);
    }

    let db = db::init_pool(config)
        .await
        .context("initializing database connection pool")?;

    if !args.skip_migrations {
        Migrator::up(&db, None)
            .await
            .context("applying warehouse migrations")?;
    }

    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> AppConfig {
        AppConfig {
            database_url: "sqlite:///nonexistent-habits-dir/warehouse.db".to_string(),
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn test_dry_run_does_not_connect() {
        let args = Args::parse_from(["habits-etl", "--dry-run"]);

        let db = open_warehouse(&unreachable_config(), &args).await.unwrap();

        assert!(matches!(db, DatabaseConnection::Disconnected));
    }
}
