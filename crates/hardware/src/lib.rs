//! Hardware Access for the Boundary Monitor
//!
//! Provides explicit, owned handles to the signal lines and buses used by
//! the monitor:
//! - GPIO lines (Linux sysfs or in-memory mock)
//! - Pulse-timing distance measurement shared by all range sensors
//! - Multi-sensor polling service
//! - LED controller (I2C), buzzer and gate servo (PWM)
//!
//! Every handle returns its line to the inactive state when dropped.

pub mod actuator;
pub mod clock;
pub mod context;
pub mod line;
pub mod mock;
pub mod pulse;
pub mod range;
pub mod sensor_service;
pub mod sysfs;

pub use actuator::{ActuatorState, Actuators, Bell, Gate, LedBus, LedController, LedIndex, PwmOutput};
pub use clock::{PulseClock, SystemClock};
pub use context::{Backend, HardwareContext, PinMap};
pub use line::{AlertActuator, InputLine, OutputLine, SignalLine};
pub use pulse::{measure_pulse, EchoTiming, PulseConfig};
pub use range::{RangeReader, RangeSensor};
pub use sensor_service::{SensorPair, SensorSample, SensorService, SensorServiceConfig, SensorTable};

use thiserror::Error;

/// Hardware error types
#[derive(Error, Debug)]
pub enum HardwareError {
    #[error("GPIO {pin}: {source}")]
    Gpio {
        pin: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("GPIO {0} is already claimed")]
    PinInUse(u32),

    #[error("LED index {index} out of range (0..={max})")]
    InvalidLedIndex { index: u8, max: u8 },

    #[error("I2C error: {0}")]
    I2c(String),

    #[error("PWM error: {0}")]
    Pwm(String),

    #[error("Signal line lock poisoned")]
    Poisoned,
}
