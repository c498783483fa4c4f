//! Single ultrasonic range sensor

use std::sync::Arc;

use crate::clock::PulseClock;
use crate::line::{InputLine, OutputLine};
use crate::pulse::{measure_pulse, PulseConfig};
use crate::HardwareError;

/// Anything that can produce one distance reading on demand.
///
/// `Ok(None)` means no echo within the timeout, which is distinct from a
/// reading of zero.
pub trait RangeReader: Send {
    fn read_cm(&mut self) -> Result<Option<f64>, HardwareError>;
}

/// Trigger/echo pair with its own clock and timing settings
pub struct RangeSensor {
    trigger: Box<dyn OutputLine>,
    echo: Box<dyn InputLine>,
    clock: Arc<dyn PulseClock>,
    config: PulseConfig,
}

impl RangeSensor {
    pub fn new(
        trigger: Box<dyn OutputLine>,
        echo: Box<dyn InputLine>,
        clock: Arc<dyn PulseClock>,
        config: PulseConfig,
    ) -> Self {
        Self {
            trigger,
            echo,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &PulseConfig {
        &self.config
    }
}

impl RangeReader for RangeSensor {
    fn read_cm(&mut self) -> Result<Option<f64>, HardwareError> {
        measure_pulse(
            self.trigger.as_mut(),
            self.echo.as_mut(),
            self.clock.as_ref(),
            &self.config,
        )
    }
}
