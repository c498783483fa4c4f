//! Per-frame telemetry sinks

use tracing::info;

use crate::pipeline::FrameReport;

/// Write-only consumer of frame results. The monitor works without one.
pub trait TelemetrySink: Send {
    fn record(&mut self, report: &FrameReport);
}

/// Logs a status summary every `interval` frames
pub struct LogTelemetry {
    interval: u64,
}

impl LogTelemetry {
    pub fn new(interval: u64) -> Self {
        Self { interval }
    }
}

impl TelemetrySink for LogTelemetry {
    fn record(&mut self, report: &FrameReport) {
        if self.interval == 0 || report.frame_number % self.interval != 0 {
            return;
        }

        info!(
            "Frame {}: {} objects, {} near boundary",
            report.frame_number,
            report.proximity.distances.len(),
            report.proximity.near.len()
        );
        for entry in &report.proximity.distances {
            info!(
                "  {} at ({}, {}): {:.1}px from boundary",
                entry.object.color, entry.object.center.x, entry.object.center.y, entry.distance
            );
        }
    }
}
