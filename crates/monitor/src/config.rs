//! Monitor configuration
//!
//! Layered as built-in defaults, then an optional TOML file, then
//! `PARKMON_*` environment variables (`__` separates nested keys, e.g.
//! `PARKMON_ALERT__COOLDOWN_SECS=3`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use alerting::AlertConfig;
use camera_capture::CameraConfig;
use color_detect::DetectorConfig;
use hardware::{EchoTiming, PinMap, PulseConfig};
use region::{Point, RegionCalibrator};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::proximity::ProximityConfig;
use crate::MonitorError;

pub const ENV_PREFIX: &str = "PARKMON";

/// Region corners given up front. Empty means the centered default area.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalibrationConfig {
    pub points: Vec<Point>,
}

impl CalibrationConfig {
    pub fn calibrator(&self, camera: &CameraConfig) -> Result<RegionCalibrator, MonitorError> {
        if self.points.is_empty() {
            return Ok(RegionCalibrator::with_default_area(camera.width, camera.height));
        }
        Ok(RegionCalibrator::from_points(&self.points)?)
    }
}

/// Frame loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Directory of still frames fed to the loop
    pub frames_dir: PathBuf,
    /// Pause between frames; 0 runs as fast as frames arrive
    pub frame_delay_secs: f64,
    /// Log a status line every this many frames; 0 disables it
    pub status_interval: u64,
    /// Use in-memory lines instead of sysfs GPIO
    pub mock_hardware: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            frames_dir: PathBuf::from("frames"),
            frame_delay_secs: 0.1,
            status_interval: 30,
            mock_hardware: false,
        }
    }
}

impl RunConfig {
    pub fn frame_delay(&self) -> Duration {
        Duration::from_secs_f64(self.frame_delay_secs.max(0.0))
    }
}

/// Full monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub camera: CameraConfig,
    pub calibration: CalibrationConfig,
    pub detector: DetectorConfig,
    pub proximity: ProximityConfig,
    pub alert: AlertConfig,
    /// Range sensor read on each alert activation
    pub range: PulseConfig,
    pub pins: PinMap,
    pub run: RunConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            calibration: CalibrationConfig::default(),
            detector: DetectorConfig::default(),
            proximity: ProximityConfig::default(),
            alert: AlertConfig::default(),
            range: PulseConfig {
                timing: EchoTiming::LoopStart,
                timeout: Duration::from_millis(100),
            },
            pins: PinMap::default(),
            run: RunConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Load defaults, then `path` if given, then the environment
    pub fn load(path: Option<&Path>) -> Result<Self, MonitorError> {
        let mut builder =
            ::config::Config::builder().add_source(::config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            info!("Loading configuration from {}", path.display());
            builder = builder.add_source(::config::File::from(path));
        }

        let config = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }
}
