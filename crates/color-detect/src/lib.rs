//! Color Object Detection
//!
//! Finds colored objects in a frame, restricted to the monitored region:
//! - HSV color classes, including hue ranges that wrap around 0/180
//! - Morphological cleanup of each class mask
//! - External contour extraction and shape filtering
//!
//! Detection is independent per frame; nothing is tracked across frames.

pub mod color;
pub mod config;
pub mod contour;
pub mod detector;
pub mod hsv;
pub mod object;
pub mod shape;

pub use color::{build_color_classes, ColorClassSpec};
pub use config::{ColorRangeConfig, DetectorConfig};
pub use detector::ColorObjectDetector;
pub use hsv::{Hsv, HsvBound, HsvRange};
pub use object::{BoundingBox, DetectedObject};
pub use shape::{Rejection, ShapeFilter};

use thiserror::Error;

/// Detection error types
#[derive(Error, Debug)]
pub enum DetectError {
    #[error("Invalid color class {name:?}: {reason}")]
    InvalidColorClass { name: String, reason: String },

    #[error("Invalid HSV bound: {0}")]
    InvalidHsv(String),

    #[error("Region mask is {mask_width}x{mask_height} but frame is {frame_width}x{frame_height}")]
    MaskSize {
        mask_width: u32,
        mask_height: u32,
        frame_width: u32,
        frame_height: u32,
    },

    #[error("Invalid frame format")]
    InvalidFrame,

    #[error("Configuration error: {0}")]
    Config(String),
}
