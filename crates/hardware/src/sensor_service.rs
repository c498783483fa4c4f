//! Round-robin polling of several range sensors

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread::JoinHandle;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, trace, warn};

use crate::actuator::LedIndex;
use crate::clock::PulseClock;
use crate::line::{InputLine, OutputLine};
use crate::pulse::{measure_pulse, EchoTiming, PulseConfig};

/// One measurement from the service
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    pub index: usize,
    /// `None` when the echo timed out
    pub distance_cm: Option<f64>,
}

/// Sensor service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorServiceConfig {
    /// Pause after each individual measurement
    #[serde(with = "crate::pulse::secs_f64")]
    pub interval: Duration,
    /// Readings below this light the sensor's LEDs
    pub threshold_cm: f64,
    pub pulse: PulseConfig,
    /// LEDs switched by each sensor, by sensor index
    pub led_map: Vec<Vec<LedIndex>>,
    pub channel_capacity: usize,
}

impl Default for SensorServiceConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            threshold_cm: 30.0,
            pulse: PulseConfig {
                timing: EchoTiming::EdgeDetected,
                timeout: Duration::from_millis(100),
            },
            led_map: LedIndex::all().take(5).map(|led| vec![led]).collect(),
            channel_capacity: 100,
        }
    }
}

impl SensorServiceConfig {
    /// LED writes implied by one sample. A timed-out reading switches the
    /// LEDs off.
    pub fn led_commands(&self, sample: &SensorSample) -> Vec<(LedIndex, bool)> {
        let near = matches!(sample.distance_cm, Some(d) if d < self.threshold_cm);
        self.led_map
            .get(sample.index)
            .map(|leds| leds.iter().map(|&led| (led, near)).collect())
            .unwrap_or_default()
    }
}

/// Trigger/echo lines of one sensor
pub struct SensorPair {
    pub trigger: Box<dyn OutputLine>,
    pub echo: Box<dyn InputLine>,
}

/// Latest reading per sensor, shared with readers outside the worker
#[derive(Debug, Clone)]
pub struct SensorTable {
    readings: Arc<RwLock<Vec<Option<f64>>>>,
}

impl SensorTable {
    pub fn new(count: usize) -> Self {
        Self {
            readings: Arc::new(RwLock::new(vec![None; count])),
        }
    }

    pub fn len(&self) -> usize {
        self.readings.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `None` for an unknown sensor, `Some(None)` before the first echo
    pub fn get(&self, index: usize) -> Option<Option<f64>> {
        self.readings.read().ok()?.get(index).copied()
    }

    pub fn snapshot(&self) -> Vec<Option<f64>> {
        self.readings.read().map(|r| r.clone()).unwrap_or_default()
    }

    fn record(&self, sample: &SensorSample) {
        if let Ok(mut readings) = self.readings.write() {
            if let Some(slot) = readings.get_mut(sample.index) {
                *slot = sample.distance_cm;
            }
        }
    }
}

/// Background service measuring every sensor in turn
pub struct SensorService {
    receiver: mpsc::Receiver<SensorSample>,
    table: SensorTable,
    shutdown: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl SensorService {
    /// Spawn the polling thread. It owns the lines and releases them on exit.
    pub fn spawn(
        config: SensorServiceConfig,
        sensors: Vec<SensorPair>,
        clock: Arc<dyn PulseClock>,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<SensorSample>(config.channel_capacity.max(1));
        let table = SensorTable::new(sensors.len());
        let shutdown = Arc::new(AtomicBool::new(false));

        let worker_table = table.clone();
        let worker_shutdown = shutdown.clone();
        let worker = std::thread::spawn(move || {
            let mut sensors = sensors;
            info!("Sensor service polling {} sensors", sensors.len());

            'poll: while !worker_shutdown.load(Ordering::SeqCst) {
                for (index, sensor) in sensors.iter_mut().enumerate() {
                    if worker_shutdown.load(Ordering::SeqCst) {
                        break 'poll;
                    }

                    match measure_pulse(
                        sensor.trigger.as_mut(),
                        sensor.echo.as_mut(),
                        clock.as_ref(),
                        &config.pulse,
                    ) {
                        Ok(distance_cm) => {
                            let sample = SensorSample { index, distance_cm };
                            worker_table.record(&sample);
                            match tx.try_send(sample) {
                                Ok(()) => {}
                                Err(TrySendError::Full(_)) => trace!("Sample queue full"),
                                Err(TrySendError::Closed(_)) => {
                                    debug!("Sample receiver dropped");
                                    break 'poll;
                                }
                            }
                        }
                        Err(e) => warn!("Sensor {} read error: {}", index, e),
                    }

                    std::thread::sleep(config.interval);
                }
            }

            debug!("Sensor service stopped");
        });

        Self {
            receiver: rx,
            table,
            shutdown,
            worker: Some(worker),
        }
    }

    /// Receive next sample
    pub async fn next(&mut self) -> Option<SensorSample> {
        self.receiver.recv().await
    }

    pub fn table(&self) -> SensorTable {
        self.table.clone()
    }

    /// Stop polling and wait for the worker to release its lines
    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.receiver.close();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Sensor worker panicked");
            }
        }
    }
}

impl Drop for SensorService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockLine, SteppingClock};
    use crate::HardwareError;

    /// Low for `low` polls, high for `high` polls, then low once; repeats
    struct CyclingEcho {
        low: usize,
        high: usize,
        polls: usize,
    }

    impl InputLine for CyclingEcho {
        fn is_high(&mut self) -> Result<bool, HardwareError> {
            let phase = self.polls % (self.low + self.high + 1);
            self.polls += 1;
            Ok(phase >= self.low && phase < self.low + self.high)
        }
    }

    fn config() -> SensorServiceConfig {
        SensorServiceConfig {
            interval: Duration::from_millis(1),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_samples_published_round_robin() {
        let clock = Arc::new(SteppingClock::new(Duration::from_micros(10)));
        let near_trigger = MockLine::new();
        let sensors = vec![
            SensorPair {
                trigger: Box::new(near_trigger.clone()),
                // 100 high polls at 10 µs -> 1 ms -> 17.15 cm
                echo: Box::new(CyclingEcho {
                    low: 20,
                    high: 100,
                    polls: 0,
                }),
            },
            SensorPair {
                trigger: Box::new(MockLine::new()),
                echo: Box::new(MockLine::new()),
            },
        ];

        let mut service = SensorService::spawn(config(), sensors, clock);

        let first = service.next().await.unwrap();
        assert_eq!(first.index, 0);
        let cm = first.distance_cm.unwrap();
        assert!((cm - 17.15).abs() < 0.5, "got {}", cm);

        let second = service.next().await.unwrap();
        assert_eq!(second, SensorSample { index: 1, distance_cm: None });

        let table = service.table();
        assert_eq!(table.len(), 2);
        assert!(table.get(0).unwrap().is_some());
        assert_eq!(table.get(5), None);

        service.shutdown();
        assert!(!near_trigger.level());
    }

    /// Trigger line that reports when it has been released
    struct ReleaseFlag(Arc<AtomicBool>);

    impl OutputLine for ReleaseFlag {
        fn set(&mut self, _high: bool) -> Result<(), HardwareError> {
            Ok(())
        }
    }

    impl Drop for ReleaseFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_drop_releases_lines() {
        let clock = Arc::new(SteppingClock::new(Duration::from_micros(10)));
        let released = Arc::new(AtomicBool::new(false));
        let sensors = vec![SensorPair {
            trigger: Box::new(ReleaseFlag(released.clone())),
            echo: Box::new(MockLine::new()),
        }];

        let mut service = SensorService::spawn(config(), sensors, clock);
        assert!(service.next().await.is_some());
        assert!(!released.load(Ordering::SeqCst));

        drop(service);
        assert!(released.load(Ordering::SeqCst));
    }

    #[test]
    fn test_led_commands_follow_threshold() {
        let config = SensorServiceConfig::default();
        let led0 = LedIndex::new(0).unwrap();

        let near = SensorSample { index: 0, distance_cm: Some(12.0) };
        assert_eq!(config.led_commands(&near), vec![(led0, true)]);

        let far = SensorSample { index: 0, distance_cm: Some(30.0) };
        assert_eq!(config.led_commands(&far), vec![(led0, false)]);

        let silent = SensorSample { index: 0, distance_cm: None };
        assert_eq!(config.led_commands(&silent), vec![(led0, false)]);

        let unmapped = SensorSample { index: 9, distance_cm: Some(1.0) };
        assert!(config.led_commands(&unmapped).is_empty());
    }
}
