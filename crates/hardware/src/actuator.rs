//! LED controller, buzzer and gate servo

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::os::unix::io::AsRawFd;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::line::OutputLine;
use crate::HardwareError;

/// `I2C_SLAVE` request from linux/i2c-dev.h
const I2C_SLAVE: libc::c_ulong = 0x0703;

/// Highest LED index on the controller board
pub const MAX_LED_INDEX: u8 = 11;

/// LED position on the controller, validated once at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct LedIndex(u8);

impl LedIndex {
    pub fn new(index: u8) -> Result<Self, HardwareError> {
        if index > MAX_LED_INDEX {
            return Err(HardwareError::InvalidLedIndex {
                index,
                max: MAX_LED_INDEX,
            });
        }
        Ok(Self(index))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = LedIndex> {
        (0..=MAX_LED_INDEX).map(LedIndex)
    }
}

impl TryFrom<u8> for LedIndex {
    type Error = HardwareError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::new(index)
    }
}

impl From<LedIndex> for u8 {
    fn from(index: LedIndex) -> u8 {
        index.0
    }
}

/// Byte-level bus the LED controller is attached to
pub trait LedBus: Send {
    fn write(&mut self, bytes: &[u8]) -> Result<(), HardwareError>;
}

/// Linux i2c-dev handle bound to one slave address
#[derive(Debug)]
pub struct I2cBus {
    file: File,
    address: u16,
}

impl I2cBus {
    pub fn open(path: &Path, address: u16) -> Result<Self, HardwareError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| HardwareError::I2c(format!("{}: {}", path.display(), e)))?;

        // SAFETY: fd is a valid open i2c-dev descriptor owned by `file`
        let rc = unsafe { libc::ioctl(file.as_raw_fd(), I2C_SLAVE as _, address as libc::c_ulong) };
        if rc < 0 {
            return Err(HardwareError::I2c(format!(
                "select address {:#04x}: {}",
                address,
                std::io::Error::last_os_error()
            )));
        }

        debug!("Opened {} at {:#04x}", path.display(), address);
        Ok(Self { file, address })
    }
}

impl LedBus for I2cBus {
    fn write(&mut self, bytes: &[u8]) -> Result<(), HardwareError> {
        self.file
            .write_all(bytes)
            .map_err(|e| HardwareError::I2c(format!("write to {:#04x}: {}", self.address, e)))
    }
}

/// LED board driven by `[index, state]` messages
pub struct LedController {
    bus: Box<dyn LedBus>,
}

impl LedController {
    pub fn new(bus: Box<dyn LedBus>) -> Self {
        Self { bus }
    }

    pub fn set(&mut self, index: LedIndex, on: bool) -> Result<(), HardwareError> {
        debug!("LED {} {}", index.get(), if on { "ON" } else { "OFF" });
        self.bus.write(&[index.get(), on as u8])
    }
}

/// Buzzer on a plain output line
pub struct Bell {
    line: Box<dyn OutputLine>,
}

impl Bell {
    pub fn new(line: Box<dyn OutputLine>) -> Self {
        Self { line }
    }

    pub fn ring(&mut self) -> Result<(), HardwareError> {
        self.line.set(true)
    }

    pub fn stop(&mut self) -> Result<(), HardwareError> {
        self.line.set(false)
    }
}

/// Duty-cycle output
pub trait PwmOutput: Send {
    fn set_duty_percent(&mut self, percent: f64) -> Result<(), HardwareError>;
}

pub const GATE_OPEN_ANGLE: f64 = 90.0;
pub const GATE_CLOSE_ANGLE: f64 = 0.0;
pub const SERVO_FREQUENCY_HZ: u32 = 50;

/// Gate arm on a hobby servo
pub struct Gate {
    pwm: Box<dyn PwmOutput>,
}

impl Gate {
    pub fn new(pwm: Box<dyn PwmOutput>) -> Self {
        Self { pwm }
    }

    /// Servo duty cycle for an angle: 2.5 % at 0°, 12.5 % at 180°
    pub fn duty_for_angle(angle: f64) -> f64 {
        2.5 + (angle / 180.0) * 10.0
    }

    pub fn open(&mut self) -> Result<(), HardwareError> {
        self.pwm.set_duty_percent(Self::duty_for_angle(GATE_OPEN_ANGLE))
    }

    pub fn close(&mut self) -> Result<(), HardwareError> {
        self.pwm
            .set_duty_percent(Self::duty_for_angle(GATE_CLOSE_ANGLE))
    }
}

/// Last commanded output state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorState {
    pub led_status: BTreeMap<u8, bool>,
    pub gate_status: bool,
    pub bell_status: bool,
}

impl Default for ActuatorState {
    fn default() -> Self {
        Self {
            led_status: LedIndex::all().map(|i| (i.get(), false)).collect(),
            gate_status: false,
            bell_status: false,
        }
    }
}

/// All actuators plus their tracked state
pub struct Actuators {
    leds: LedController,
    gate: Gate,
    bell: Bell,
    state: ActuatorState,
}

impl Actuators {
    pub fn new(leds: LedController, gate: Gate, bell: Bell) -> Self {
        Self {
            leds,
            gate,
            bell,
            state: ActuatorState::default(),
        }
    }

    pub fn state(&self) -> &ActuatorState {
        &self.state
    }

    pub fn set_led(&mut self, index: LedIndex, on: bool) -> Result<(), HardwareError> {
        self.leds.set(index, on)?;
        self.state.led_status.insert(index.get(), on);
        Ok(())
    }

    pub fn set_gate(&mut self, open: bool) -> Result<(), HardwareError> {
        if open {
            self.gate.open()?;
        } else {
            self.gate.close()?;
        }
        info!("Gate {}", if open { "opened" } else { "closed" });
        self.state.gate_status = open;
        Ok(())
    }

    pub fn set_bell(&mut self, ringing: bool) -> Result<(), HardwareError> {
        if ringing {
            self.bell.ring()?;
        } else {
            self.bell.stop()?;
        }
        info!("Bell {}", if ringing { "ringing" } else { "stopped" });
        self.state.bell_status = ringing;
        Ok(())
    }
}
