//! Ultrasonic pulse timing
//!
//! A measurement raises the trigger line for 10 µs, then times how long the
//! echo line stays high. Sound travels at ~343 m/s and covers the distance
//! twice, so the distance in centimeters is `seconds * 17150`.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::clock::PulseClock;
use crate::line::{InputLine, OutputLine};
use crate::HardwareError;

/// Half the speed of sound, in cm/s
pub const HALF_SPEED_OF_SOUND_CM_S: f64 = 17_150.0;

/// Width of the trigger pulse
pub const TRIGGER_PULSE: Duration = Duration::from_micros(10);

/// How the edges of the echo pulse are timestamped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EchoTiming {
    /// Rise time is the last poll that still saw the line low, and fall
    /// time is the last poll that still saw it high. Both stamps land up
    /// to one polling interval before their edge: the early rise stamp
    /// lengthens the measured width, the early fall stamp shortens it.
    LoopStart,
    /// Each edge is timestamped on the first poll that observes it.
    EdgeDetected,
}

/// Pulse measurement settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PulseConfig {
    pub timing: EchoTiming,
    /// Shared deadline for both echo waits
    #[serde(with = "secs_f64")]
    pub timeout: Duration,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            timing: EchoTiming::LoopStart,
            timeout: Duration::from_millis(100),
        }
    }
}

pub(crate) mod secs_f64 {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

/// Fire one pulse and time its echo.
///
/// Returns `Ok(None)` when the echo does not rise, or does not fall, before
/// `config.timeout` elapses from the end of the trigger pulse, or when the
/// measured width is zero. Never busy-waits past the deadline.
pub fn measure_pulse(
    trigger: &mut dyn OutputLine,
    echo: &mut dyn InputLine,
    clock: &dyn PulseClock,
    config: &PulseConfig,
) -> Result<Option<f64>, HardwareError> {
    trigger.set(true)?;
    clock.delay(TRIGGER_PULSE);
    trigger.set(false)?;

    let begin = clock.now();
    let deadline = begin + config.timeout;
    let loop_start = config.timing == EchoTiming::LoopStart;

    let mut rise = begin;
    loop {
        if echo.is_high()? {
            break;
        }
        let now = clock.now();
        if now >= deadline {
            trace!("Echo never rose");
            return Ok(None);
        }
        if loop_start {
            rise = now;
        }
    }
    if !loop_start {
        rise = clock.now();
    }

    let mut fall = rise;
    loop {
        if !echo.is_high()? {
            break;
        }
        let now = clock.now();
        if now >= deadline {
            trace!("Echo never fell");
            return Ok(None);
        }
        if loop_start {
            fall = now;
        }
    }
    if !loop_start {
        fall = clock.now();
    }

    Ok(pulse_distance_cm(rise, fall))
}

fn pulse_distance_cm(rise: Instant, fall: Instant) -> Option<f64> {
    if fall <= rise {
        return None;
    }
    let cm = (fall - rise).as_secs_f64() * HALF_SPEED_OF_SOUND_CM_S;
    Some((cm * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockLine, ScriptedEcho, SteppingClock};
    use std::sync::Arc;

    const STEP: Duration = Duration::from_micros(10);

    fn measure(echo: &mut ScriptedEcho, clock: &SteppingClock, timing: EchoTiming) -> Option<f64> {
        let mut trigger = MockLine::new();
        let config = PulseConfig {
            timing,
            timeout: Duration::from_millis(100),
        };
        measure_pulse(&mut trigger, echo, clock, &config).unwrap()
    }

    #[test]
    fn test_silent_echo_times_out() {
        let clock = Arc::new(SteppingClock::new(STEP));
        let mut echo = ScriptedEcho::silent(clock.clone());

        assert_eq!(measure(&mut echo, &clock, EchoTiming::LoopStart), None);
        // Gave up at the deadline, not later
        assert!(clock.elapsed() <= Duration::from_millis(101));
    }

    #[test]
    fn test_echo_that_never_falls_times_out() {
        let clock = Arc::new(SteppingClock::new(STEP));
        let mut echo =
            ScriptedEcho::pulse(clock.clone(), Duration::from_millis(1), Duration::from_secs(5));

        assert_eq!(measure(&mut echo, &clock, EchoTiming::EdgeDetected), None);
    }

    #[test]
    fn test_edge_detected_distance() {
        let clock = Arc::new(SteppingClock::new(STEP));
        // 2 ms echo -> 34.3 cm
        let mut echo =
            ScriptedEcho::pulse(clock.clone(), Duration::from_millis(1), Duration::from_millis(3));

        let cm = measure(&mut echo, &clock, EchoTiming::EdgeDetected).unwrap();
        assert!((cm - 34.3).abs() < 0.5, "got {}", cm);
    }

    #[test]
    fn test_loop_start_stamps_lead_edge_detection() {
        let clock = Arc::new(SteppingClock::new(STEP));
        let mut echo =
            ScriptedEcho::pulse(clock.clone(), Duration::from_millis(1), Duration::from_millis(3));
        let loop_start = measure(&mut echo, &clock, EchoTiming::LoopStart).unwrap();

        let clock = Arc::new(SteppingClock::new(STEP));
        let mut echo =
            ScriptedEcho::pulse(clock.clone(), Duration::from_millis(1), Duration::from_millis(3));
        let edge = measure(&mut echo, &clock, EchoTiming::EdgeDetected).unwrap();

        // Both stamps lead their edge by at most a step, so the width holds
        assert!((loop_start - 34.3).abs() < 0.5, "got {}", loop_start);
        assert!(loop_start <= edge);
    }

    #[test]
    fn test_trigger_pulses_high_then_low() {
        let clock = SteppingClock::new(STEP);
        let mut trigger = MockLine::new();
        let mut echo = MockLine::new();

        let reading =
            measure_pulse(&mut trigger, &mut echo, &clock, &PulseConfig::default()).unwrap();
        assert_eq!(reading, None);
        assert_eq!(trigger.writes(), vec![true, false]);
    }

    #[test]
    fn test_distance_rounded_to_two_decimals() {
        let rise = Instant::now();
        let fall = rise + Duration::from_nanos(1_234_567);
        assert_eq!(pulse_distance_cm(rise, fall), Some(21.17));
        assert_eq!(pulse_distance_cm(rise, rise), None);
    }
}
