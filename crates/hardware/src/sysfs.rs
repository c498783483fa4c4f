//! Linux sysfs GPIO and PWM backends

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::actuator::PwmOutput;
use crate::line::{InputLine, OutputLine};
use crate::HardwareError;

pub const GPIO_ROOT: &str = "/sys/class/gpio";
pub const PWM_ROOT: &str = "/sys/class/pwm";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

/// One exported GPIO pin. Unexported on drop; outputs are driven low first.
#[derive(Debug)]
pub struct SysfsGpio {
    root: PathBuf,
    pin: u32,
    direction: Direction,
}

impl SysfsGpio {
    pub fn output(pin: u32) -> Result<Self, HardwareError> {
        Self::open(Path::new(GPIO_ROOT), pin, Direction::Out)
    }

    pub fn input(pin: u32) -> Result<Self, HardwareError> {
        Self::open(Path::new(GPIO_ROOT), pin, Direction::In)
    }

    /// Export `pin` under `root` and set its direction
    pub fn open(root: &Path, pin: u32, direction: Direction) -> Result<Self, HardwareError> {
        let gpio_err = |source: io::Error| HardwareError::Gpio { pin, source };
        let pin_dir = root.join(format!("gpio{}", pin));

        if !pin_dir.exists() {
            fs::write(root.join("export"), pin.to_string()).map_err(gpio_err)?;
        }
        fs::write(pin_dir.join("direction"), direction.as_str()).map_err(gpio_err)?;

        debug!("Exported GPIO {} as {:?}", pin, direction);
        Ok(Self {
            root: root.to_path_buf(),
            pin,
            direction,
        })
    }

    pub fn pin(&self) -> u32 {
        self.pin
    }

    fn value_path(&self) -> PathBuf {
        self.root.join(format!("gpio{}", self.pin)).join("value")
    }
}

impl OutputLine for SysfsGpio {
    fn set(&mut self, high: bool) -> Result<(), HardwareError> {
        fs::write(self.value_path(), if high { "1" } else { "0" }).map_err(|source| {
            HardwareError::Gpio {
                pin: self.pin,
                source,
            }
        })
    }
}

impl InputLine for SysfsGpio {
    fn is_high(&mut self) -> Result<bool, HardwareError> {
        let raw = fs::read_to_string(self.value_path()).map_err(|source| HardwareError::Gpio {
            pin: self.pin,
            source,
        })?;
        Ok(raw.trim() == "1")
    }
}

impl Drop for SysfsGpio {
    fn drop(&mut self) {
        if self.direction == Direction::Out {
            if let Err(e) = self.set(false) {
                warn!("Failed to drive GPIO {} low: {}", self.pin, e);
            }
        }
        if let Err(e) = fs::write(self.root.join("unexport"), self.pin.to_string()) {
            warn!("Failed to unexport GPIO {}: {}", self.pin, e);
        }
    }
}

/// One PWM channel of a sysfs pwmchip
#[derive(Debug)]
pub struct SysfsPwm {
    chip: PathBuf,
    channel: u32,
    period_ns: u64,
}

impl SysfsPwm {
    pub fn open(chip: u32, channel: u32, frequency_hz: u32) -> Result<Self, HardwareError> {
        Self::open_at(
            &Path::new(PWM_ROOT).join(format!("pwmchip{}", chip)),
            channel,
            frequency_hz,
        )
    }

    pub fn open_at(chip: &Path, channel: u32, frequency_hz: u32) -> Result<Self, HardwareError> {
        if frequency_hz == 0 {
            return Err(HardwareError::Pwm("frequency must be positive".into()));
        }
        let pwm = Self {
            chip: chip.to_path_buf(),
            channel,
            period_ns: 1_000_000_000 / frequency_hz as u64,
        };

        if !pwm.channel_dir().exists() {
            pwm.write_attr(&chip.join("export"), &channel.to_string())?;
        }
        pwm.write_attr(&pwm.channel_dir().join("period"), &pwm.period_ns.to_string())?;
        pwm.write_attr(&pwm.channel_dir().join("duty_cycle"), "0")?;
        pwm.write_attr(&pwm.channel_dir().join("enable"), "1")?;

        debug!(
            "PWM channel {} enabled at {} Hz",
            channel, frequency_hz
        );
        Ok(pwm)
    }

    fn channel_dir(&self) -> PathBuf {
        self.chip.join(format!("pwm{}", self.channel))
    }

    fn write_attr(&self, path: &Path, value: &str) -> Result<(), HardwareError> {
        fs::write(path, value)
            .map_err(|e| HardwareError::Pwm(format!("{}: {}", path.display(), e)))
    }
}

impl PwmOutput for SysfsPwm {
    fn set_duty_percent(&mut self, percent: f64) -> Result<(), HardwareError> {
        let duty_ns = (self.period_ns as f64 * percent.clamp(0.0, 100.0) / 100.0).round() as u64;
        self.write_attr(&self.channel_dir().join("duty_cycle"), &duty_ns.to_string())
    }
}

impl Drop for SysfsPwm {
    fn drop(&mut self) {
        let _ = self.write_attr(&self.channel_dir().join("enable"), "0");
        if let Err(e) = self.write_attr(&self.chip.join("unexport"), &self.channel.to_string()) {
            warn!("Failed to unexport PWM channel {}: {}", self.channel, e);
        }
    }
}
