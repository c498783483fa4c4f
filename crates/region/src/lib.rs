//! Monitored Region
//!
//! The boundary polygon of the monitored area and the geometry evaluated
//! against it:
//! - Point-in-polygon (ray casting) and distance to the boundary
//! - Four-point calibration (pointer clicks, typed coordinates, or defaults)
//! - Binary region mask for restricting detection

pub mod calibrator;
pub mod geometry;
pub mod mask;

pub use calibrator::{parse_point, RegionCalibrator};
pub use geometry::{distance_to_boundary, point_in_polygon};
pub use mask::region_mask;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of corners in a calibrated region
pub const POLYGON_CORNERS: usize = 4;

/// Region error types
#[derive(Error, Debug)]
pub enum RegionError {
    #[error("Invalid point {0:?}: expected \"x,y\" integer coordinates")]
    InvalidPoint(String),

    #[error("Region needs exactly {POLYGON_CORNERS} points, got {0}")]
    PointCount(usize),
}

/// Pixel coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Calibrated boundary: exactly four corners in traversal order.
///
/// Edge `i` joins corner `i` to corner `(i + 1) % 4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polygon([Point; POLYGON_CORNERS]);

impl Polygon {
    pub fn new(corners: [Point; POLYGON_CORNERS]) -> Self {
        Self(corners)
    }

    /// Corners in traversal order
    pub fn corners(&self) -> &[Point; POLYGON_CORNERS] {
        &self.0
    }

    /// Edges as `(start, end)` pairs, closing back to the first corner
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        (0..POLYGON_CORNERS).map(move |i| (self.0[i], self.0[(i + 1) % POLYGON_CORNERS]))
    }

    /// Whether `point` lies inside the boundary
    pub fn contains(&self, point: Point) -> bool {
        point_in_polygon(point, &self.0)
    }

    /// Shortest distance from `point` to the line through any edge
    pub fn distance_to_boundary(&self, point: Point) -> f64 {
        distance_to_boundary(point, &self.0)
    }
}
