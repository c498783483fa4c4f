//! Frame pipeline: detect, evaluate, alert

use std::sync::Arc;
use std::time::Duration;

use alerting::{AlertOutcome, AlertStateMachine};
use camera_capture::{FrameSource, VideoFrame};
use color_detect::ColorObjectDetector;
use hardware::HardwareContext;
use image::GrayImage;
use metrics::{counter, gauge};
use region::{region_mask, Polygon, RegionCalibrator};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::MonitorConfig;
use crate::proximity::{ProximityEvaluator, ProximityResult};
use crate::telemetry::{LogTelemetry, TelemetrySink};
use crate::MonitorError;

/// Result of one processed frame
#[derive(Debug, Clone)]
pub struct FrameReport {
    /// 1-based count of frames processed by this monitor
    pub frame_number: u64,
    /// Sequence number carried by the frame
    pub sequence: u32,
    pub proximity: ProximityResult,
    pub alert: AlertOutcome,
}

/// Why the frame loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    Shutdown,
    SourceFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub stop: StopReason,
}

/// Region mask for the last seen polygon and frame size
#[derive(Default)]
struct RegionMaskCache {
    key: Option<(Option<Polygon>, u32, u32)>,
    mask: GrayImage,
}

impl RegionMaskCache {
    fn mask_for(&mut self, polygon: Option<&Polygon>, width: u32, height: u32) -> &GrayImage {
        let key = (polygon.copied(), width, height);
        if self.key != Some(key) {
            debug!("Building region mask for {}x{}", width, height);
            self.mask = region_mask(polygon, width, height);
            self.key = Some(key);
        }
        &self.mask
    }
}

/// The boundary monitor
pub struct Monitor {
    calibrator: RegionCalibrator,
    detector: ColorObjectDetector,
    evaluator: ProximityEvaluator,
    alert: AlertStateMachine,
    telemetry: Option<Box<dyn TelemetrySink>>,
    region: RegionMaskCache,
    frames: u64,
}

impl Monitor {
    pub fn new(
        calibrator: RegionCalibrator,
        detector: ColorObjectDetector,
        evaluator: ProximityEvaluator,
        alert: AlertStateMachine,
    ) -> Self {
        Self {
            calibrator,
            detector,
            evaluator,
            alert,
            telemetry: None,
            region: RegionMaskCache::default(),
            frames: 0,
        }
    }

    /// Build every component from configuration, taking the alert signal
    /// and range sensor lines from `hardware`
    pub fn from_config(
        config: &MonitorConfig,
        hardware: &mut HardwareContext,
    ) -> Result<Self, MonitorError> {
        let calibrator = config.calibration.calibrator(&config.camera)?;
        let detector = ColorObjectDetector::new(&config.detector)?;
        let evaluator = ProximityEvaluator::new(&config.proximity);

        let signal = Arc::new(hardware.alert_signal()?);
        let range = hardware.range_sensor(config.range)?;
        let alert = AlertStateMachine::new(config.alert.clone(), signal, Some(Box::new(range)));

        let mut monitor = Self::new(calibrator, detector, evaluator, alert);
        if config.run.status_interval > 0 {
            monitor = monitor.with_telemetry(Box::new(LogTelemetry::new(config.run.status_interval)));
        }
        Ok(monitor)
    }

    pub fn with_telemetry(mut self, sink: Box<dyn TelemetrySink>) -> Self {
        self.telemetry = Some(sink);
        self
    }

    pub fn calibrator(&self) -> &RegionCalibrator {
        &self.calibrator
    }

    /// Recalibrate between frames; the region mask follows on the next frame
    pub fn calibrator_mut(&mut self) -> &mut RegionCalibrator {
        &mut self.calibrator
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames
    }

    /// Run detection, proximity and alerting for one frame
    pub fn process_frame(&mut self, frame: &VideoFrame) -> Result<FrameReport, MonitorError> {
        let polygon = self.calibrator.polygon();
        let region = self
            .region
            .mask_for(polygon.as_ref(), frame.width, frame.height);
        let objects = self.detector.detect(frame, region, polygon.as_ref())?;

        let proximity = self.evaluator.evaluate(&objects, polygon.as_ref());
        let alert = self.alert.evaluate(proximity.is_alert(), Instant::now())?;
        self.frames += 1;

        counter!("monitor_frames_total").increment(1);
        counter!("monitor_detections_total").increment(objects.len() as u64);
        gauge!("monitor_near_boundary").set(proximity.near.len() as f64);
        if matches!(alert, AlertOutcome::Triggered { .. }) {
            counter!("monitor_alerts_total").increment(1);
        }

        debug!(
            "Frame {} (seq {}): {} objects, {} near, {:?}",
            self.frames,
            frame.sequence,
            objects.len(),
            proximity.near.len(),
            alert
        );

        let report = FrameReport {
            frame_number: self.frames,
            sequence: frame.sequence,
            proximity,
            alert,
        };
        if let Some(sink) = self.telemetry.as_mut() {
            sink.record(&report);
        }
        Ok(report)
    }

    /// Process frames until the source ends or fails, or `shutdown` becomes
    /// true. The alert signal is released on every exit path.
    pub async fn run<S: FrameSource + ?Sized>(
        &mut self,
        source: &mut S,
        mut shutdown: watch::Receiver<bool>,
        frame_delay: Duration,
    ) -> Result<RunSummary, MonitorError> {
        info!("Monitor loop started");
        let outcome = self.drive(source, &mut shutdown, frame_delay).await;

        let cleanup = self.alert.shutdown();
        if let Err(e) = &cleanup {
            warn!("Failed to release alert signal: {}", e);
        }

        let stop = outcome?;
        cleanup?;
        info!("Monitor stopped after {} frames: {:?}", self.frames, stop);
        Ok(RunSummary {
            frames: self.frames,
            stop,
        })
    }

    async fn drive<S: FrameSource + ?Sized>(
        &mut self,
        source: &mut S,
        shutdown: &mut watch::Receiver<bool>,
        frame_delay: Duration,
    ) -> Result<StopReason, MonitorError> {
        loop {
            if *shutdown.borrow() {
                info!("Shutdown requested");
                return Ok(StopReason::Shutdown);
            }

            let frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    info!("End of stream");
                    return Ok(StopReason::EndOfStream);
                }
                Err(e) => {
                    error!("Frame source failed: {}", e);
                    return Ok(StopReason::SourceFailed(e.to_string()));
                }
            };

            self.process_frame(&frame)?;

            if frame_delay.is_zero() {
                tokio::task::yield_now().await;
                continue;
            }
            tokio::select! {
                _ = tokio::time::sleep(frame_delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        // Nobody left to signal shutdown; keep the pacing
                        tokio::time::sleep(frame_delay).await;
                    }
                }
            }
        }
    }
}
