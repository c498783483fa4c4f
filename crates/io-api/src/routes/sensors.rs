//! Sensor Routes

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{ApiError, SharedState};

/// Response for the distance endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct DistanceResponse {
    pub sensor_index: usize,
    /// Centimeters; `null` until the sensor has echoed
    pub distance: Option<f64>,
}

/// Latest distance of one sensor
pub async fn get_distance(
    State(state): State<SharedState>,
    Path(index): Path<usize>,
) -> Result<Json<DistanceResponse>, ApiError> {
    let distance = state
        .sensors
        .get(index)
        .ok_or_else(|| ApiError::NotFound("Sensor not found".to_string()))?;

    Ok(Json(DistanceResponse {
        sensor_index: index,
        distance,
    }))
}
