//! # Proof-Ledger Node
//!
//! Entry point: telemetry, configuration, then the runtime until Ctrl+C.

use anyhow::{Context, Result};
use ledger_telemetry::{init_telemetry, TelemetryConfig};
use node_runtime::{NodeConfig, NodeRuntime};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry =
        init_telemetry(TelemetryConfig::from_env()).context("initializing telemetry")?;

    let config = NodeConfig::load().context("loading configuration")?;

    let mut runtime = NodeRuntime::new(config).await?;
    runtime.start()?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl+C")?;

    runtime.shutdown().await;
    Ok(())
}
