//! Time source for pulse measurement

use std::time::{Duration, Instant};

/// Monotonic clock used while busy-waiting on an echo line
pub trait PulseClock: Send + Sync {
    fn now(&self) -> Instant;

    /// Hold for `duration` (used for the trigger pulse width)
    fn delay(&self, duration: Duration);
}

/// Wall clock. Short delays spin instead of sleeping.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

/// Below this a thread sleep overshoots by more than the delay itself
const SPIN_LIMIT: Duration = Duration::from_millis(1);

impl PulseClock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn delay(&self, duration: Duration) {
        if duration >= SPIN_LIMIT {
            std::thread::sleep(duration);
            return;
        }
        let until = Instant::now() + duration;
        while Instant::now() < until {
            std::hint::spin_loop();
        }
    }
}
