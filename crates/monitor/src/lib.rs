//! Boundary Proximity Monitor
//!
//! Per frame: detect colored objects inside the calibrated region, measure
//! how close each one is to the region's edge, and pulse the alert signal
//! when something gets too close.

pub mod config;
pub mod pipeline;
pub mod proximity;
pub mod telemetry;

pub use config::MonitorConfig;
pub use pipeline::{FrameReport, Monitor, RunSummary, StopReason};
pub use proximity::{ObjectProximity, ProximityConfig, ProximityEvaluator, ProximityResult};
pub use telemetry::{LogTelemetry, TelemetrySink};

use alerting::AlertError;
use camera_capture::CameraError;
use color_detect::DetectError;
use hardware::HardwareError;
use region::RegionError;
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Monitor error types
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Region error: {0}")]
    Region(#[from] RegionError),

    #[error("Detection error: {0}")]
    Detect(#[from] DetectError),

    #[error("Alert error: {0}")]
    Alert(#[from] AlertError),

    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

/// Initialize logging
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}
