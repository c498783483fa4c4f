//! Camera Capture Library for the Boundary Monitor
//!
//! Provides the RGB frame type consumed by the detection pipeline and the
//! frame sources that feed it:
//! - `VideoFrame` with pixel access and `image` conversions
//! - `FrameSource` trait (`next_frame` until end-of-stream)
//! - `ImageSequenceSource` for a directory of still images

pub mod frame;
pub mod source;

pub use frame::VideoFrame;
pub use source::{FrameSource, ImageSequenceSource};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open frame source: {0}")]
    Open(String),

    #[error("Failed to decode frame {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("Frame size changed from {expected_width}x{expected_height} to {width}x{height}")]
    ResolutionChanged {
        expected_width: u32,
        expected_height: u32,
        width: u32,
        height: u32,
    },

    #[error("Invalid frame buffer: expected {expected} bytes, got {actual}")]
    Buffer { expected: usize, actual: usize },
}

impl From<std::io::Error> for CameraError {
    fn from(err: std::io::Error) -> Self {
        CameraError::Open(err.to_string())
    }
}

/// Capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Capture width
    pub width: u32,
    /// Capture height
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}
