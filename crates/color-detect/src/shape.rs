//! Contour shape filtering

use crate::config::DetectorConfig;

/// Why a contour was not reported
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    TooSmall { area: f64 },
    AspectRatio { ratio: f64 },
    Irregular { extent: f64 },
}

/// Size and shape thresholds applied to every contour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeFilter {
    pub min_area: f64,
    pub min_aspect_ratio: f64,
    pub max_aspect_ratio: f64,
    pub min_extent: f64,
}

impl Default for ShapeFilter {
    fn default() -> Self {
        Self::from(&DetectorConfig::default())
    }
}

impl From<&DetectorConfig> for ShapeFilter {
    fn from(config: &DetectorConfig) -> Self {
        Self {
            min_area: config.min_area,
            min_aspect_ratio: config.min_aspect_ratio,
            max_aspect_ratio: config.max_aspect_ratio,
            min_extent: config.min_extent,
        }
    }
}

impl ShapeFilter {
    /// Check already-measured metrics, in the order area, aspect ratio, extent
    pub fn check(&self, area: f64, aspect_ratio: f64, extent: f64) -> Result<(), Rejection> {
        if area < self.min_area {
            return Err(Rejection::TooSmall { area });
        }
        if aspect_ratio < self.min_aspect_ratio || aspect_ratio > self.max_aspect_ratio {
            return Err(Rejection::AspectRatio { ratio: aspect_ratio });
        }
        if extent < self.min_extent {
            return Err(Rejection::Irregular { extent });
        }
        Ok(())
    }
}
