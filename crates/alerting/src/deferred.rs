//! One-shot delayed signal release

use std::sync::Arc;
use std::time::Duration;

use hardware::AlertActuator;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A scheduled write of "off" to the alert signal.
///
/// The write happens after the delay no matter what the state machine has
/// done in the meantime. Dropping the handle leaves the task running;
/// [`DeferredRelease::cancel`] stops it.
#[derive(Debug)]
pub struct DeferredRelease {
    handle: JoinHandle<()>,
}

impl DeferredRelease {
    /// Schedule the release. Must be called from within a tokio runtime.
    pub fn schedule(actuator: Arc<dyn AlertActuator>, delay: Duration) -> Self {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match actuator.set_alert_signal(false) {
                Ok(()) => debug!("Alert signal released after {:?}", delay),
                Err(e) => warn!("Deferred alert release failed: {}", e),
            }
        });
        Self { handle }
    }

    pub fn is_pending(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }
}
