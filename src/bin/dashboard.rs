//! Read-only dashboard over the habits warehouse.

use anyhow::{Context, Result};
use habits_etl::{config::ConfigLoader, server::run_server, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ConfigLoader::new().load().context("loading configuration")?;
    telemetry::init_tracing(&config).context("initializing tracing")?;

    if let Ok(redacted_json) = config.redacted_json() {
        info!(profile = %config.profile, config = %redacted_json, "Loaded configuration");
    }

    run_server(config).await
}
