//! Cancelable calibration countdown.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Interval between countdown ticks.
pub const COUNTDOWN_INTERVAL: Duration = Duration::from_secs(1);

/// A running countdown. Dropping or cancelling it stops the task.
///
/// Every tick carries the countdown's generation. A tick already queued
/// when its countdown is cancelled still arrives, so the receiver compares
/// generations and ignores ticks from a countdown that is no longer
/// current.
#[derive(Debug)]
pub struct Countdown {
    generation: u64,
    handle: JoinHandle<()>,
}

impl Countdown {
    /// Start sending `generation` on `tick_tx` every `interval`, first tick
    /// one interval from now.
    pub fn start(tick_tx: mpsc::UnboundedSender<u64>, generation: u64, interval: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick of an interval completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if tick_tx.send(generation).is_err() {
                    break;
                }
            }
        });
        tracing::debug!(generation, ?interval, "Countdown started");
        Self { generation, handle }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(self) {
        tracing::debug!(generation = self.generation, "Countdown cancelled");
        self.handle.abort();
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
