//! # Light Client
//!
//! Entry point for the `light-client` binary.

use std::time::Duration;

use anyhow::{Context, Result};
use lc_runtime::{load_config, parse_address, LightClientRuntime};
use lc_telemetry::{init_logging, TelemetryConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(&TelemetryConfig::from_env()).context("Failed to initialize logging")?;

    let config = load_config();
    let watch_address = match std::env::var("LC_WATCH_ADDRESS") {
        Ok(text) => Some(parse_address(&text).context("LC_WATCH_ADDRESS")?),
        Err(_) => None,
    };

    let mut runtime = LightClientRuntime::new(config)?;
    runtime.start(watch_address).await;

    info!("Light client is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown(Duration::from_secs(2)).await;
    Ok(())
}
