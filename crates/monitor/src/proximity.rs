//! Proximity Evaluator

use color_detect::DetectedObject;
use region::Polygon;
use serde::{Deserialize, Serialize};

/// Proximity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProximityConfig {
    /// Objects closer than this to the region edge raise an alert (pixels)
    pub warning_distance: f64,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            warning_distance: 100.0,
        }
    }
}

/// One object's distance to the region edge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectProximity {
    pub object: DetectedObject,
    /// Pixels to the nearest edge line; infinite when uncalibrated
    pub distance: f64,
}

/// Outcome of one evaluation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProximityResult {
    /// Every object with its distance, in detection order
    pub distances: Vec<ObjectProximity>,
    /// Indices into `distances` of the objects under the warning distance
    pub near: Vec<usize>,
}

impl ProximityResult {
    /// True when at least one object is under the warning distance
    pub fn is_alert(&self) -> bool {
        !self.near.is_empty()
    }

    pub fn near_objects(&self) -> impl Iterator<Item = &ObjectProximity> {
        self.near.iter().map(|&i| &self.distances[i])
    }
}

pub struct ProximityEvaluator {
    warning_distance: f64,
}

impl ProximityEvaluator {
    pub fn new(config: &ProximityConfig) -> Self {
        Self {
            warning_distance: config.warning_distance,
        }
    }

    pub fn warning_distance(&self) -> f64 {
        self.warning_distance
    }

    pub fn evaluate(&self, objects: &[DetectedObject], polygon: Option<&Polygon>) -> ProximityResult {
        let mut result = ProximityResult::default();

        for object in objects {
            let distance = polygon
                .map(|p| p.distance_to_boundary(object.center))
                .unwrap_or(f64::INFINITY);

            if distance < self.warning_distance {
                result.near.push(result.distances.len());
            }
            result.distances.push(ObjectProximity {
                object: object.clone(),
                distance,
            });
        }

        result
    }
}
