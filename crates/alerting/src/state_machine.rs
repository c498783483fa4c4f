//! Alert State Machine

use std::sync::Arc;
use std::time::Duration;

use hardware::{AlertActuator, RangeReader};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::deferred::DeferredRelease;
use crate::AlertError;

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Minimum time between two activations (default: 2.0)
    pub cooldown_secs: f64,
    /// How long the signal stays asserted after an activation (default: 0.5)
    pub pulse_secs: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 2.0,
            pulse_secs: 0.5,
        }
    }
}

impl AlertConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.cooldown_secs.max(0.0))
    }

    pub fn pulse(&self) -> Duration {
        Duration::from_secs_f64(self.pulse_secs.max(0.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertPhase {
    Idle,
    Active,
}

/// What one evaluation did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlertOutcome {
    /// Signal asserted; carries the range reading taken at activation
    Triggered { range_cm: Option<f64> },
    /// Proximity persists but the cooldown has not elapsed
    CoolingDown,
    /// Nothing near the boundary; signal de-asserted
    Cleared,
}

/// Idle/Active machine driving the alert signal
pub struct AlertStateMachine {
    config: AlertConfig,
    actuator: Arc<dyn AlertActuator>,
    range: Option<Box<dyn RangeReader>>,
    phase: AlertPhase,
    last_trigger: Option<Instant>,
    trigger_count: u64,
    pending: Vec<DeferredRelease>,
}

impl AlertStateMachine {
    pub fn new(
        config: AlertConfig,
        actuator: Arc<dyn AlertActuator>,
        range: Option<Box<dyn RangeReader>>,
    ) -> Self {
        info!("Creating alert state machine with config: {:?}", config);
        Self {
            config,
            actuator,
            range,
            phase: AlertPhase::Idle,
            last_trigger: None,
            trigger_count: 0,
            pending: Vec::new(),
        }
    }

    pub fn phase(&self) -> AlertPhase {
        self.phase
    }

    pub fn last_trigger(&self) -> Option<Instant> {
        self.last_trigger
    }

    pub fn trigger_count(&self) -> u64 {
        self.trigger_count
    }

    /// Advance the machine with this frame's proximity decision.
    ///
    /// Must run inside a tokio runtime: an activation schedules the signal
    /// release as a separate task. The range reading blocks for at most the
    /// sensor's echo timeout.
    pub fn evaluate(&mut self, near: bool, now: Instant) -> Result<AlertOutcome, AlertError> {
        if !near {
            self.actuator.set_alert_signal(false)?;
            if self.phase == AlertPhase::Active {
                debug!("Proximity cleared");
            }
            self.phase = AlertPhase::Idle;
            return Ok(AlertOutcome::Cleared);
        }

        if !self.cooldown_elapsed(now) {
            return Ok(AlertOutcome::CoolingDown);
        }

        self.actuator.set_alert_signal(true)?;
        self.phase = AlertPhase::Active;
        self.last_trigger = Some(now);
        self.trigger_count += 1;

        let range_cm = self.read_range();
        match range_cm {
            Some(cm) => info!("Boundary alert #{}: range {:.2} cm", self.trigger_count, cm),
            None => info!("Boundary alert #{}: no range reading", self.trigger_count),
        }

        self.pending.retain(DeferredRelease::is_pending);
        self.pending.push(DeferredRelease::schedule(
            self.actuator.clone(),
            self.config.pulse(),
        ));

        Ok(AlertOutcome::Triggered { range_cm })
    }

    fn cooldown_elapsed(&self, now: Instant) -> bool {
        match self.last_trigger {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.config.cooldown(),
        }
    }

    fn read_range(&mut self) -> Option<f64> {
        let reader = self.range.as_mut()?;
        match reader.read_cm() {
            Ok(reading) => reading,
            Err(e) => {
                warn!("Range sensor read failed: {}", e);
                None
            }
        }
    }

    /// Cancel pending releases and de-assert the signal
    pub fn shutdown(&mut self) -> Result<(), AlertError> {
        for release in self.pending.drain(..) {
            release.cancel();
        }
        self.phase = AlertPhase::Idle;
        self.actuator.set_alert_signal(false)?;
        info!("Alert state machine shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hardware::mock::MockLine;
    use hardware::{HardwareError, SignalLine};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedRange {
        reading: Result<Option<f64>, ()>,
        reads: Arc<AtomicUsize>,
    }

    impl RangeReader for FixedRange {
        fn read_cm(&mut self) -> Result<Option<f64>, HardwareError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.reading
                .map_err(|_| HardwareError::I2c("sensor unplugged".into()))
        }
    }

    struct Fixture {
        machine: AlertStateMachine,
        line: MockLine,
        reads: Arc<AtomicUsize>,
    }

    fn fixture(reading: Result<Option<f64>, ()>) -> Fixture {
        let line = MockLine::new();
        let reads = Arc::new(AtomicUsize::new(0));
        let machine = AlertStateMachine::new(
            AlertConfig::default(),
            Arc::new(SignalLine::new(Box::new(line.clone()))),
            Some(Box::new(FixedRange {
                reading,
                reads: reads.clone(),
            })),
        );
        Fixture {
            machine,
            line,
            reads,
        }
    }

    fn assertions(line: &MockLine) -> usize {
        line.writes().iter().filter(|&&high| high).count()
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_proximity_triggers() {
        let mut f = fixture(Ok(Some(42.5)));

        let outcome = f.machine.evaluate(true, Instant::now()).unwrap();
        assert_eq!(outcome, AlertOutcome::Triggered { range_cm: Some(42.5) });
        assert_eq!(f.machine.phase(), AlertPhase::Active);
        assert!(f.line.level());
        assert_eq!(f.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_double_trigger_within_cooldown() {
        let mut f = fixture(Ok(None));
        let start = Instant::now();

        f.machine.evaluate(true, start).unwrap();
        let outcome = f
            .machine
            .evaluate(true, start + Duration::from_millis(1500))
            .unwrap();

        assert_eq!(outcome, AlertOutcome::CoolingDown);
        assert_eq!(assertions(&f.line), 1);
        assert_eq!(f.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_boundary_is_exclusive() {
        let mut f = fixture(Ok(None));
        let start = Instant::now();

        f.machine.evaluate(true, start).unwrap();
        let at_boundary = f.machine.evaluate(true, start + Duration::from_secs(2)).unwrap();
        assert_eq!(at_boundary, AlertOutcome::CoolingDown);

        let after = f
            .machine
            .evaluate(true, start + Duration::from_millis(2001))
            .unwrap();
        assert!(matches!(after, AlertOutcome::Triggered { .. }));
        assert_eq!(f.machine.trigger_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_released_after_pulse() {
        let mut f = fixture(Ok(None));
        f.machine.evaluate(true, Instant::now()).unwrap();
        assert!(f.line.level());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(f.line.level());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!f.line.level());
        // The release does not move the machine out of Active
        assert_eq!(f.machine.phase(), AlertPhase::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_proximity_clears_immediately() {
        let mut f = fixture(Ok(None));
        f.machine.evaluate(true, Instant::now()).unwrap();

        let outcome = f.machine.evaluate(false, Instant::now()).unwrap();
        assert_eq!(outcome, AlertOutcome::Cleared);
        assert_eq!(f.machine.phase(), AlertPhase::Idle);
        assert!(!f.line.level());

        // Pending release still fires harmlessly
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!f.line.level());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_release() {
        let mut f = fixture(Ok(None));
        f.machine.evaluate(true, Instant::now()).unwrap();

        f.machine.shutdown().unwrap();
        let writes_at_shutdown = f.line.writes().len();
        assert!(!f.line.level());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(f.line.writes().len(), writes_at_shutdown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_range_failure_is_not_fatal() {
        let mut f = fixture(Err(()));

        let outcome = f.machine.evaluate(true, Instant::now()).unwrap();
        assert_eq!(outcome, AlertOutcome::Triggered { range_cm: None });
        assert!(f.line.level());
    }

    #[tokio::test(start_paused = true)]
    async fn test_without_range_sensor() {
        let line = MockLine::new();
        let mut machine = AlertStateMachine::new(
            AlertConfig::default(),
            Arc::new(SignalLine::new(Box::new(line.clone()))),
            None,
        );

        let outcome = machine.evaluate(true, Instant::now()).unwrap();
        assert_eq!(outcome, AlertOutcome::Triggered { range_cm: None });
    }
}
