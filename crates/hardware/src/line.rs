//! Digital signal lines

use std::sync::Mutex;

use tracing::warn;

use crate::HardwareError;

/// A digital output (trigger line, LED, buzzer)
pub trait OutputLine: Send {
    fn set(&mut self, high: bool) -> Result<(), HardwareError>;
}

/// A digital input (echo line)
pub trait InputLine: Send {
    fn is_high(&mut self) -> Result<bool, HardwareError>;
}

impl<T: OutputLine + ?Sized> OutputLine for Box<T> {
    fn set(&mut self, high: bool) -> Result<(), HardwareError> {
        (**self).set(high)
    }
}

impl<T: InputLine + ?Sized> InputLine for Box<T> {
    fn is_high(&mut self) -> Result<bool, HardwareError> {
        (**self).is_high()
    }
}

/// The alert indicator as seen by the monitor.
///
/// Writes are idempotent and may come from several tasks.
pub trait AlertActuator: Send + Sync {
    fn set_alert_signal(&self, on: bool) -> Result<(), HardwareError>;
}

/// An output line shared between the frame loop and deferred writers.
///
/// Each write happens under the lock, so concurrent writers never
/// interleave on the line.
pub struct SignalLine {
    line: Mutex<Box<dyn OutputLine>>,
}

impl SignalLine {
    pub fn new(line: Box<dyn OutputLine>) -> Self {
        Self {
            line: Mutex::new(line),
        }
    }
}

impl AlertActuator for SignalLine {
    fn set_alert_signal(&self, on: bool) -> Result<(), HardwareError> {
        let mut line = self.line.lock().map_err(|_| HardwareError::Poisoned)?;
        line.set(on)
    }
}

impl Drop for SignalLine {
    fn drop(&mut self) {
        if let Ok(line) = self.line.get_mut() {
            if let Err(e) = line.set(false) {
                warn!("Failed to release alert signal: {}", e);
            }
        }
    }
}
