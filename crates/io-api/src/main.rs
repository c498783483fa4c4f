//! Parking IO API Server - Main Entry Point
//!
//! Usage: `parkmon-io [config.toml]`

use std::path::PathBuf;

use anyhow::Context;
use io_api::{init_logging, run_server, IoConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("=== Parking IO Server v{} ===", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = IoConfig::load(config_path.as_deref()).context("loading configuration")?;

    run_server(config).await?;

    Ok(())
}
