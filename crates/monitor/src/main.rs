//! Boundary Proximity Monitor - Main Entry Point
//!
//! Usage: `parkmon [config.toml]`

use std::path::PathBuf;

use anyhow::Context;
use camera_capture::ImageSequenceSource;
use hardware::HardwareContext;
use monitor::{init_logging, Monitor, MonitorConfig};
use tokio::sync::watch;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("=== Boundary Proximity Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = MonitorConfig::load(config_path.as_deref()).context("loading configuration")?;

    let mut hardware = if config.run.mock_hardware {
        HardwareContext::mock(config.pins.clone())
    } else {
        HardwareContext::sysfs(config.pins.clone())
    };

    let mut source = ImageSequenceSource::open(&config.run.frames_dir)
        .with_context(|| format!("opening frames in {}", config.run.frames_dir.display()))?;

    let mut monitor = Monitor::from_config(&config, &mut hardware)?;
    info!("Monitoring region {:?}", monitor.calibrator().points());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, stopping");
            let _ = shutdown_tx.send(true);
        }
    });

    let summary = monitor
        .run(&mut source, shutdown_rx, config.run.frame_delay())
        .await?;
    info!("Processed {} frames ({:?})", summary.frames, summary.stop);

    Ok(())
}
