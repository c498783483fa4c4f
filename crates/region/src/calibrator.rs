//! Region calibration

use tracing::{debug, info};

use crate::{Point, Polygon, RegionError, POLYGON_CORNERS};

/// Collects the four corners of the monitored region.
///
/// Points arrive from pointer clicks or typed coordinates. The region is
/// complete once four points are held; further points are ignored until
/// `reset`.
#[derive(Debug, Clone, Default)]
pub struct RegionCalibrator {
    points: Vec<Point>,
}

impl RegionCalibrator {
    /// Create an empty (uncalibrated) calibrator
    pub fn new() -> Self {
        Self::default()
    }

    /// Calibrate directly from four corners
    pub fn from_points(points: &[Point]) -> Result<Self, RegionError> {
        if points.len() != POLYGON_CORNERS {
            return Err(RegionError::PointCount(points.len()));
        }
        let mut calibrator = Self::new();
        for &p in points {
            calibrator.add_point(p);
        }
        Ok(calibrator)
    }

    /// Centered rectangle covering the middle half of a `width` x `height` frame
    pub fn with_default_area(width: u32, height: u32) -> Self {
        let (w, h) = (width as i32, height as i32);
        let margin_x = w / 4;
        let margin_y = h / 4;

        let calibrator = Self {
            points: vec![
                Point::new(margin_x, margin_y),
                Point::new(w - margin_x, margin_y),
                Point::new(w - margin_x, h - margin_y),
                Point::new(margin_x, h - margin_y),
            ],
        };
        info!("Default region set: {:?}", calibrator.points);
        calibrator
    }

    /// Calibrate from typed `"x,y"` lines, one per corner.
    ///
    /// On any malformed line the calibrator is left empty.
    pub fn from_text_lines<'a, I>(lines: I) -> Result<Self, RegionError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let points = lines
            .into_iter()
            .take(POLYGON_CORNERS)
            .map(parse_point)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_points(&points)
    }

    /// Forget all points
    pub fn reset(&mut self) {
        debug!("Region calibration reset");
        self.points.clear();
    }

    /// Append a corner. Returns `false` (and changes nothing) once complete.
    pub fn add_point(&mut self, point: Point) -> bool {
        if self.is_complete() {
            return false;
        }
        self.points.push(point);
        debug!("Corner {} set: ({}, {})", self.points.len(), point.x, point.y);

        if self.is_complete() {
            info!("Region calibration complete: {:?}", self.points);
        }
        true
    }

    /// Whether all four corners are set
    pub fn is_complete(&self) -> bool {
        self.points.len() == POLYGON_CORNERS
    }

    /// Corners collected so far, in insertion order
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// The calibrated polygon, once complete
    pub fn polygon(&self) -> Option<Polygon> {
        let corners: [Point; POLYGON_CORNERS] = self.points.as_slice().try_into().ok()?;
        Some(Polygon::new(corners))
    }
}

/// Parse a typed `"x,y"` coordinate
pub fn parse_point(input: &str) -> Result<Point, RegionError> {
    let invalid = || RegionError::InvalidPoint(input.to_string());
    let (x, y) = input.trim().split_once(',').ok_or_else(invalid)?;
    let x = x.trim().parse().map_err(|_| invalid())?;
    let y = y.trim().parse().map_err(|_| invalid())?;
    Ok(Point::new(x, y))
}
