//! Alerting System
//!
//! Turns per-frame proximity decisions into short pulses on the alert
//! signal, with a cooldown between activations.

mod deferred;
mod state_machine;

pub use deferred::DeferredRelease;
pub use state_machine::{AlertConfig, AlertOutcome, AlertPhase, AlertStateMachine};

use hardware::HardwareError;
use thiserror::Error;

/// Alerting error types
#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Alert signal write failed: {0}")]
    Signal(#[from] HardwareError),
}
