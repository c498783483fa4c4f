//! Detected objects

use region::Point;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    /// Box center on the pixel grid (integer halves round down)
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }
}

/// One colored object found in a single frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedObject {
    /// Color class name
    pub color: String,

    /// Bounding box center
    pub center: Point,

    /// Bounding box
    pub bbox: BoundingBox,

    /// Contour area (pixels)
    pub area: f64,

    /// Bounding box width / height
    pub aspect_ratio: f64,

    /// Contour area / bounding box area
    pub extent: f64,
}
