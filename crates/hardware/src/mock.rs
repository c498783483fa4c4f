//! In-memory lines and clock for tests and hardware-less runs

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::actuator::{LedBus, PwmOutput};
use crate::clock::PulseClock;
use crate::line::{InputLine, OutputLine};
use crate::HardwareError;

#[derive(Debug, Default)]
struct MockState {
    level: bool,
    writes: Vec<bool>,
}

/// A line whose level lives in memory. Clones share the same line.
#[derive(Debug, Clone, Default)]
pub struct MockLine {
    state: Arc<Mutex<MockState>>,
}

impl MockLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self) -> bool {
        self.state.lock().map(|s| s.level).unwrap_or(false)
    }

    /// Drive the line from outside (e.g. simulate an echo)
    pub fn set_level(&self, high: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.level = high;
        }
    }

    /// Every value written through [`OutputLine::set`], oldest first
    pub fn writes(&self) -> Vec<bool> {
        self.state
            .lock()
            .map(|s| s.writes.clone())
            .unwrap_or_default()
    }
}

impl OutputLine for MockLine {
    fn set(&mut self, high: bool) -> Result<(), HardwareError> {
        let mut state = self.state.lock().map_err(|_| HardwareError::Poisoned)?;
        state.level = high;
        state.writes.push(high);
        Ok(())
    }
}

impl InputLine for MockLine {
    fn is_high(&mut self) -> Result<bool, HardwareError> {
        let state = self.state.lock().map_err(|_| HardwareError::Poisoned)?;
        Ok(state.level)
    }
}

/// Clock that advances a fixed step on every reading
#[derive(Debug)]
pub struct SteppingClock {
    base: Instant,
    elapsed_ns: AtomicU64,
    step_ns: u64,
}

impl SteppingClock {
    pub fn new(step: Duration) -> Self {
        Self {
            base: Instant::now(),
            elapsed_ns: AtomicU64::new(0),
            step_ns: step.as_nanos() as u64,
        }
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_ns.load(Ordering::SeqCst))
    }
}

impl PulseClock for SteppingClock {
    fn now(&self) -> Instant {
        let ns = self.elapsed_ns.fetch_add(self.step_ns, Ordering::SeqCst);
        self.base + Duration::from_nanos(ns)
    }

    fn delay(&self, duration: Duration) {
        self.elapsed_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
    }
}

/// Echo input that is high during a fixed window of a [`SteppingClock`]'s time
pub struct ScriptedEcho {
    clock: Arc<SteppingClock>,
    window: Option<(Duration, Duration)>,
}

impl ScriptedEcho {
    /// High from `rise` until `fall`, measured from clock creation
    pub fn pulse(clock: Arc<SteppingClock>, rise: Duration, fall: Duration) -> Self {
        Self {
            clock,
            window: Some((rise, fall)),
        }
    }

    /// Never rises
    pub fn silent(clock: Arc<SteppingClock>) -> Self {
        Self {
            clock,
            window: None,
        }
    }
}

impl InputLine for ScriptedEcho {
    fn is_high(&mut self) -> Result<bool, HardwareError> {
        let now = self.clock.elapsed();
        Ok(matches!(self.window, Some((rise, fall)) if now >= rise && now < fall))
    }
}

/// LED bus that records every message
#[derive(Debug, Clone, Default)]
pub struct MockLedBus {
    messages: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MockLedBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<Vec<u8>> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

impl LedBus for MockLedBus {
    fn write(&mut self, bytes: &[u8]) -> Result<(), HardwareError> {
        self.messages
            .lock()
            .map_err(|_| HardwareError::Poisoned)?
            .push(bytes.to_vec());
        Ok(())
    }
}

/// PWM output that remembers the last duty cycle
#[derive(Debug, Clone, Default)]
pub struct MockPwm {
    duty: Arc<Mutex<Option<f64>>>,
}

impl MockPwm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duty(&self) -> Option<f64> {
        self.duty.lock().ok().and_then(|d| *d)
    }
}

impl PwmOutput for MockPwm {
    fn set_duty_percent(&mut self, percent: f64) -> Result<(), HardwareError> {
        *self.duty.lock().map_err(|_| HardwareError::Poisoned)? = Some(percent);
        Ok(())
    }
}
