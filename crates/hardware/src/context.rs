//! Hardware context
//!
//! The single owner of the board's pins. Components receive their lines from
//! here instead of touching global GPIO state, and every line hands itself
//! back (driven low, unexported) when dropped.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::actuator::{Actuators, Bell, Gate, I2cBus, LedController, SERVO_FREQUENCY_HZ};
use crate::clock::{PulseClock, SystemClock};
use crate::line::{InputLine, OutputLine, SignalLine};
use crate::mock::{MockLedBus, MockLine, MockPwm};
use crate::pulse::PulseConfig;
use crate::range::RangeSensor;
use crate::sensor_service::SensorPair;
use crate::sysfs::{SysfsGpio, SysfsPwm};
use crate::HardwareError;

/// BCM pin assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinMap {
    /// Alert indicator LED
    pub alert_led: u32,
    pub range_trigger: u32,
    pub range_echo: u32,
    /// (trigger, echo) per sensor of the polling service
    pub sensors: Vec<(u32, u32)>,
    pub buzzer: u32,
    pub pwm_chip: u32,
    pub servo_channel: u32,
    pub i2c_bus: PathBuf,
    pub led_address: u16,
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            alert_led: 18,
            range_trigger: 24,
            range_echo: 23,
            sensors: vec![(5, 6), (13, 19), (12, 16), (20, 21), (23, 24)],
            buzzer: 17,
            pwm_chip: 0,
            servo_channel: 0,
            i2c_bus: PathBuf::from("/dev/i2c-1"),
            led_address: 0x08,
        }
    }
}

/// In-memory stand-ins for every device
#[derive(Debug, Default)]
pub struct MockBackend {
    lines: HashMap<u32, MockLine>,
    led_bus: MockLedBus,
    pwm: MockPwm,
}

/// Where lines come from
#[derive(Debug)]
pub enum Backend {
    Sysfs,
    Mock(MockBackend),
}

/// Owner of the pin map. Each pin can be claimed once per context.
#[derive(Debug)]
pub struct HardwareContext {
    pins: PinMap,
    backend: Backend,
    claimed: HashSet<u32>,
    clock: Arc<SystemClock>,
}

impl HardwareContext {
    /// Real GPIO through Linux sysfs
    pub fn sysfs(pins: PinMap) -> Self {
        info!("Hardware context on sysfs GPIO");
        Self::with_backend(pins, Backend::Sysfs)
    }

    /// No hardware; lines are in memory and inspectable with [`Self::mock_line`]
    pub fn mock(pins: PinMap) -> Self {
        info!("Hardware context on mock lines");
        Self::with_backend(pins, Backend::Mock(MockBackend::default()))
    }

    fn with_backend(pins: PinMap, backend: Backend) -> Self {
        Self {
            pins,
            backend,
            claimed: HashSet::new(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn pins(&self) -> &PinMap {
        &self.pins
    }

    pub fn clock(&self) -> Arc<dyn PulseClock> {
        self.clock.clone()
    }

    /// Handle to a claimed mock line, for tests and simulation
    pub fn mock_line(&self, pin: u32) -> Option<MockLine> {
        match &self.backend {
            Backend::Mock(mock) => mock.lines.get(&pin).cloned(),
            Backend::Sysfs => None,
        }
    }

    fn claim(&mut self, pin: u32) -> Result<(), HardwareError> {
        if !self.claimed.insert(pin) {
            return Err(HardwareError::PinInUse(pin));
        }
        Ok(())
    }

    /// Run `claim` and give back every pin it claimed if it fails
    fn claim_together<T>(
        &mut self,
        claim: impl FnOnce(&mut Self) -> Result<T, HardwareError>,
    ) -> Result<T, HardwareError> {
        let before = self.claimed.clone();
        let result = claim(self);
        if result.is_err() {
            self.claimed = before;
        }
        result
    }

    pub fn output(&mut self, pin: u32) -> Result<Box<dyn OutputLine>, HardwareError> {
        self.claim(pin)?;
        let line: Box<dyn OutputLine> = match &mut self.backend {
            Backend::Sysfs => Box::new(SysfsGpio::output(pin)?),
            Backend::Mock(mock) => Box::new(mock.lines.entry(pin).or_default().clone()),
        };
        Ok(line)
    }

    pub fn input(&mut self, pin: u32) -> Result<Box<dyn InputLine>, HardwareError> {
        self.claim(pin)?;
        let line: Box<dyn InputLine> = match &mut self.backend {
            Backend::Sysfs => Box::new(SysfsGpio::input(pin)?),
            Backend::Mock(mock) => Box::new(mock.lines.entry(pin).or_default().clone()),
        };
        Ok(line)
    }

    /// The alert indicator line, starting de-asserted
    pub fn alert_signal(&mut self) -> Result<SignalLine, HardwareError> {
        let mut line = self.output(self.pins.alert_led)?;
        line.set(false)?;
        Ok(SignalLine::new(line))
    }

    pub fn range_sensor(&mut self, config: PulseConfig) -> Result<RangeSensor, HardwareError> {
        self.claim_together(|ctx| {
            let trigger = ctx.output(ctx.pins.range_trigger)?;
            let echo = ctx.input(ctx.pins.range_echo)?;
            Ok(RangeSensor::new(trigger, echo, ctx.clock(), config))
        })
    }

    /// Lines for every polling pair. Nothing stays claimed on failure.
    pub fn sensor_pairs(&mut self) -> Result<Vec<SensorPair>, HardwareError> {
        let pairs = self.pins.sensors.clone();
        self.claim_together(|ctx| {
            pairs
                .into_iter()
                .map(|(trigger, echo)| {
                    Ok(SensorPair {
                        trigger: ctx.output(trigger)?,
                        echo: ctx.input(echo)?,
                    })
                })
                .collect()
        })
    }

    pub fn actuators(&mut self) -> Result<Actuators, HardwareError> {
        self.claim_together(Self::claim_actuators)
    }

    fn claim_actuators(&mut self) -> Result<Actuators, HardwareError> {
        let buzzer = self.output(self.pins.buzzer)?;
        let (leds, gate) = match &self.backend {
            Backend::Sysfs => (
                LedController::new(Box::new(I2cBus::open(
                    &self.pins.i2c_bus,
                    self.pins.led_address,
                )?)),
                Gate::new(Box::new(SysfsPwm::open(
                    self.pins.pwm_chip,
                    self.pins.servo_channel,
                    SERVO_FREQUENCY_HZ,
                )?)),
            ),
            Backend::Mock(mock) => (
                LedController::new(Box::new(mock.led_bus.clone())),
                Gate::new(Box::new(mock.pwm.clone())),
            ),
        };
        Ok(Actuators::new(leds, gate, Bell::new(buzzer)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::AlertActuator;
    use crate::range::RangeReader;
    use std::time::Duration;

    #[test]
    fn test_pin_claimed_once() {
        let mut ctx = HardwareContext::mock(PinMap::default());
        assert!(ctx.output(18).is_ok());
        assert!(matches!(ctx.output(18), Err(HardwareError::PinInUse(18))));
    }

    #[test]
    fn test_alert_signal_released_on_drop() {
        let mut ctx = HardwareContext::mock(PinMap::default());
        let signal = ctx.alert_signal().unwrap();
        let led = ctx.mock_line(18).unwrap();

        signal.set_alert_signal(true).unwrap();
        assert!(led.level());

        drop(signal);
        assert!(!led.level());
    }

    #[test]
    fn test_mock_range_sensor_without_echo() {
        let mut ctx = HardwareContext::mock(PinMap::default());
        let mut sensor = ctx
            .range_sensor(PulseConfig {
                timeout: Duration::from_millis(5),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(sensor.read_cm().unwrap(), None);
    }

    #[test]
    fn test_sensor_pairs_conflict_with_range_pins() {
        // Range sensor pins are reused by the fifth polling pair
        let mut ctx = HardwareContext::mock(PinMap::default());
        ctx.range_sensor(PulseConfig::default()).unwrap();
        assert!(matches!(ctx.sensor_pairs(), Err(HardwareError::PinInUse(_))));

        // Pairs before the conflict were given back
        assert!(ctx.output(5).is_ok());
        assert!(ctx.input(6).is_ok());
        assert!(ctx.output(20).is_ok());
    }

    #[test]
    fn test_mock_actuators() {
        let mut ctx = HardwareContext::mock(PinMap::default());
        let mut actuators = ctx.actuators().unwrap();
        actuators.set_bell(true).unwrap();
        assert!(ctx.mock_line(17).unwrap().level());
    }
}
