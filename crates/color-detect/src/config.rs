//! Detector configuration

use serde::{Deserialize, Serialize};

use crate::hsv::HsvRange;
use crate::DetectError;

/// One configured HSV range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorRangeConfig {
    /// Class name reported on detections
    pub name: String,
    /// Lower `[h, s, v]` bound (inclusive, hue 0..=180)
    pub lower: [u8; 3],
    /// Upper `[h, s, v]` bound (inclusive)
    pub upper: [u8; 3],
    /// Secondary range: OR into this class instead of forming its own
    #[serde(default)]
    pub merge_into: Option<String>,
}

impl ColorRangeConfig {
    pub fn new(name: &str, lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self {
            name: name.to_string(),
            lower,
            upper,
            merge_into: None,
        }
    }

    pub(crate) fn range(&self) -> Result<HsvRange, DetectError> {
        HsvRange::from_triples(self.lower, self.upper)
    }
}

/// Color object detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Color ranges, in reporting order
    pub colors: Vec<ColorRangeConfig>,

    /// Minimum contour area (pixels)
    pub min_area: f64,

    /// Accepted bounding-box aspect ratio (width / height)
    pub min_aspect_ratio: f64,
    pub max_aspect_ratio: f64,

    /// Minimum contour area / bounding-box area
    pub min_extent: f64,

    /// Side of the square structuring element for open/close (odd)
    pub kernel_size: u8,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            colors: vec![
                ColorRangeConfig::new("red", [0, 50, 50], [10, 255, 255]),
                ColorRangeConfig {
                    merge_into: Some("red".to_string()),
                    ..ColorRangeConfig::new("red2", [170, 50, 50], [180, 255, 255])
                },
                ColorRangeConfig::new("blue", [100, 50, 50], [130, 255, 255]),
                ColorRangeConfig::new("orange", [10, 50, 50], [25, 255, 255]),
                ColorRangeConfig::new("yellow", [25, 50, 50], [35, 255, 255]),
            ],
            min_area: 800.0,
            min_aspect_ratio: 0.3,
            max_aspect_ratio: 3.0,
            min_extent: 0.3,
            kernel_size: 7,
        }
    }
}
