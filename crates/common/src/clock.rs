//! Session time base.
//!
//! Sensor timestamps are nanoseconds since the session epoch, a monotonic
//! instant taken when the session starts. The wall-clock time of that
//! instant is kept alongside so recordings can be dated.

use std::time::{Duration, Instant};

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Monotonic nanosecond clock anchored at session start.
#[derive(Debug, Clone)]
pub struct SessionClock {
    epoch: Instant,
    /// RFC 3339, UTC.
    epoch_wall: String,
}

impl SessionClock {
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Nanoseconds since the epoch.
    pub fn elapsed_ns(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    pub fn ns_to_secs(ns: u64) -> f64 {
        ns as f64 / NANOS_PER_SEC
    }

    /// Negative and NaN inputs map to zero.
    pub fn secs_to_ns(secs: f64) -> u64 {
        if secs.is_nan() || secs <= 0.0 {
            return 0;
        }
        (secs * NANOS_PER_SEC) as u64
    }
}

/// Gate for readers that sample the aim state at a fixed rate.
///
/// Ticks are scheduled on a fixed grid from the first tick, so a reader
/// fed by jittery timestamps keeps its long-run rate. A reader that falls
/// more than one interval behind restarts the grid instead of bursting.
#[derive(Debug, Clone)]
pub struct RateController {
    interval_ns: u64,
    next_due_ns: Option<u64>,
}

impl RateController {
    /// A zero rate is treated as 1 Hz.
    pub fn new(target_hz: u32) -> Self {
        Self {
            interval_ns: 1_000_000_000 / u64::from(target_hz.max(1)),
            next_due_ns: None,
        }
    }

    /// Whether a tick is due at `now_ns`. The first call always ticks.
    pub fn should_tick(&mut self, now_ns: u64) -> bool {
        let due = match self.next_due_ns {
            None => now_ns,
            Some(due) if now_ns >= due => due,
            Some(_) => return false,
        };

        let next = due + self.interval_ns;
        self.next_due_ns = Some(if now_ns >= next {
            now_ns + self.interval_ns
        } else {
            next
        });
        true
    }

    pub fn interval(&self) -> Duration {
        Duration::from_nanos(self.interval_ns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_elapsed() {
        let clock = SessionClock::start();
        assert!(clock.elapsed_ns() < 1_000_000_000);
        assert!(!clock.epoch_wall().is_empty());
    }

    #[test]
    fn test_secs_ns_conversion() {
        assert!((SessionClock::ns_to_secs(1_500_000_000) - 1.5).abs() < 1e-9);
        assert_eq!(SessionClock::secs_to_ns(2.0), 2_000_000_000);
        assert_eq!(SessionClock::secs_to_ns(-1.0), 0);
        assert_eq!(SessionClock::secs_to_ns(f64::NAN), 0);
    }

    #[test]
    fn test_rate_controller_keeps_grid() {
        let mut ctrl = RateController::new(10);
        assert!(ctrl.should_tick(0));
        assert!(!ctrl.should_tick(60_000_000));
        // Late by 20ms; the next tick is still due at 200ms.
        assert!(ctrl.should_tick(120_000_000));
        assert!(!ctrl.should_tick(190_000_000));
        assert!(ctrl.should_tick(200_000_000));
    }

    #[test]
    fn test_rate_controller_resyncs_after_stall() {
        let mut ctrl = RateController::new(10);
        assert!(ctrl.should_tick(0));
        assert!(ctrl.should_tick(1_000_000_000));
        assert!(!ctrl.should_tick(1_050_000_000));
        assert!(ctrl.should_tick(1_100_000_000));
    }

    #[test]
    fn test_zero_rate_is_one_hz() {
        assert_eq!(RateController::new(0).interval(), Duration::from_secs(1));
    }
}
