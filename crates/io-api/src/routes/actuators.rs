//! Actuator Routes

use axum::{
    extract::{Path, State},
    Json,
};
use hardware::{ActuatorState, LedIndex};
use serde::{Deserialize, Serialize};

use crate::{ApiError, SharedState};

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// Current LED, gate and bell state
pub async fn get_status(State(state): State<SharedState>) -> Json<ActuatorState> {
    Json(state.actuators.lock().await.state().clone())
}

/// `/led/{index}/on` or `/led/{index}/off`
pub async fn control_led(
    State(state): State<SharedState>,
    Path((index, action)): Path<(u8, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    let led = LedIndex::new(index).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let on = match action.as_str() {
        "on" => true,
        "off" => false,
        _ => {
            return Err(ApiError::BadRequest(
                "Invalid action. Use 'on' or 'off'.".to_string(),
            ))
        }
    };

    state.actuators.lock().await.set_led(led, on)?;
    Ok(MessageResponse::new(format!(
        "LED {} turned {}",
        index,
        if on { "ON" } else { "OFF" }
    )))
}

/// `/gate/open` or `/gate/close`
pub async fn control_gate(
    State(state): State<SharedState>,
    Path(action): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let open = match action.as_str() {
        "open" => true,
        "close" => false,
        _ => {
            return Err(ApiError::BadRequest(
                "Invalid action. Use 'open' or 'close'.".to_string(),
            ))
        }
    };

    state.actuators.lock().await.set_gate(open)?;
    Ok(MessageResponse::new(if open {
        "Gate opened"
    } else {
        "Gate closed"
    }))
}

/// `/bell/ring` or `/bell/stop`
pub async fn control_bell(
    State(state): State<SharedState>,
    Path(action): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let ringing = match action.as_str() {
        "ring" => true,
        "stop" => false,
        _ => {
            return Err(ApiError::BadRequest(
                "Invalid action. Use 'ring' or 'stop'.".to_string(),
            ))
        }
    };

    state.actuators.lock().await.set_bell(ringing)?;
    Ok(MessageResponse::new(if ringing {
        "Bell ringing"
    } else {
        "Bell stopped"
    }))
}
