//! Dwell-to-click activation.
//!
//! The aim counts as stable while the L1 gap between target and displayed
//! aim stays under [`STABILITY_THRESHOLD`]. Holding it stable for the hold
//! duration fires one click at the displayed position. Any instability
//! before that resets the dwell completely: there is no partial credit.
//!
//! ```text
//!          stable                     progress == 1 (click)
//!   Idle ─────────▶ Hovering{since} ─────────────────────────▶ Idle
//!     ▲                 │
//!     └──── unstable ───┘
//! ```

use headaim_model::aim::AimPoint;
use headaim_model::sample::TimestampNs;
use serde::{Deserialize, Serialize};

/// L1 gap below which the aim counts as stable.
pub const STABILITY_THRESHOLD: f64 = 0.012;

/// Dwell state machine state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DwellState {
    Idle,
    Hovering { since: TimestampNs, progress: f64 },
}

impl DwellState {
    pub fn progress(&self) -> f64 {
        match self {
            DwellState::Idle => 0.0,
            DwellState::Hovering { progress, .. } => *progress,
        }
    }

    pub fn is_hovering(&self) -> bool {
        matches!(self, DwellState::Hovering { .. })
    }
}

/// Hold-to-click detector.
#[derive(Debug, Clone)]
pub struct DwellActivation {
    hold_duration_ns: u64,
    state: DwellState,
}

impl DwellActivation {
    pub fn new(hold_duration_ns: u64) -> Self {
        Self {
            hold_duration_ns: hold_duration_ns.max(1),
            state: DwellState::Idle,
        }
    }

    pub fn from_secs(hold_duration_secs: f64) -> Self {
        Self::new((hold_duration_secs.max(0.0) * 1_000_000_000.0) as u64)
    }

    pub fn state(&self) -> DwellState {
        self.state
    }

    pub fn hold_duration_ns(&self) -> u64 {
        self.hold_duration_ns
    }

    /// Drop any dwell in progress.
    pub fn reset(&mut self) {
        self.state = DwellState::Idle;
    }

    /// Evaluate one tick. Returns the click position when the dwell
    /// completes.
    pub fn update(
        &mut self,
        target: &AimPoint,
        displayed: &AimPoint,
        now: TimestampNs,
    ) -> Option<AimPoint> {
        let stable = target.l1_distance(displayed) < STABILITY_THRESHOLD;

        match self.state {
            DwellState::Idle => {
                if stable {
                    tracing::trace!(now, "Dwell started");
                    self.state = DwellState::Hovering {
                        since: now,
                        progress: 0.0,
                    };
                }
                None
            }
            DwellState::Hovering { since, .. } => {
                if !stable {
                    tracing::trace!(now, "Dwell broken");
                    self.state = DwellState::Idle;
                    return None;
                }

                let progress = self.progress_between(since, now);
                if progress >= 1.0 {
                    tracing::debug!(x = displayed.x, y = displayed.y, "Dwell click");
                    self.state = DwellState::Idle;
                    return Some(*displayed);
                }

                self.state = DwellState::Hovering { since, progress };
                None
            }
        }
    }

    fn progress_between(&self, since: TimestampNs, now: TimestampNs) -> f64 {
        (now.saturating_sub(since) as f64 / self.hold_duration_ns as f64).min(1.0)
    }
}

/// Visual hints for the progress ring and crosshair while dwelling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DwellFeedback {
    /// Ring sweep in degrees, starting at twelve o'clock.
    pub sweep_degrees: f64,
    /// Ring alpha in `0..=200`.
    pub ring_alpha: u8,
    /// Crosshair scale multiplier.
    pub crosshair_scale: f64,
}

impl DwellFeedback {
    pub fn from_progress(progress: f64) -> Self {
        let progress = progress.clamp(0.0, 1.0);
        Self {
            sweep_degrees: 360.0 * progress,
            ring_alpha: (200.0 * progress) as u8,
            crosshair_scale: if progress > 0.1 {
                1.0 + progress * 0.3
            } else {
                1.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: u64 = 1_000_000;

    fn still() -> (AimPoint, AimPoint) {
        (AimPoint::CENTER, AimPoint::CENTER)
    }

    #[test]
    fn test_idle_to_hovering_on_stable() {
        let mut dwell = DwellActivation::new(1000 * MS);
        let (t, d) = still();
        assert!(dwell.update(&t, &d, 0).is_none());
        assert_eq!(
            dwell.state(),
            DwellState::Hovering {
                since: 0,
                progress: 0.0
            }
        );
    }

    #[test]
    fn test_unstable_stays_idle() {
        let mut dwell = DwellActivation::new(1000 * MS);
        let target = AimPoint::new(0.5, 0.5);
        let displayed = AimPoint::new(0.51, 0.503);
        assert!(dwell.update(&target, &displayed, 0).is_none());
        assert_eq!(dwell.state(), DwellState::Idle);
    }

    #[test]
    fn test_progress_accumulates() {
        let mut dwell = DwellActivation::new(1000 * MS);
        let (t, d) = still();
        dwell.update(&t, &d, 0);
        dwell.update(&t, &d, 250 * MS);
        assert!((dwell.state().progress() - 0.25).abs() < 1e-12);
        dwell.update(&t, &d, 500 * MS);
        assert!((dwell.state().progress() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_break_resets_without_partial_credit() {
        let mut dwell = DwellActivation::new(1000 * MS);
        let (t, d) = still();
        for i in 0..9 {
            dwell.update(&t, &d, i * 100 * MS);
        }
        assert!(dwell.state().progress() > 0.7);

        let jitter = AimPoint::new(0.52, 0.5);
        assert!(dwell.update(&jitter, &d, 900 * MS).is_none());
        assert_eq!(dwell.state(), DwellState::Idle);
        assert_eq!(dwell.state().progress(), 0.0);

        // Resuming starts a fresh hover.
        dwell.update(&t, &d, 1000 * MS);
        assert_eq!(
            dwell.state(),
            DwellState::Hovering {
                since: 1000 * MS,
                progress: 0.0
            }
        );
    }

    #[test]
    fn test_fires_once_when_progress_reaches_one() {
        let mut dwell = DwellActivation::new(1000 * MS);
        let (t, d) = still();
        let mut clicks = Vec::new();
        for i in 0..=10 {
            if let Some(p) = dwell.update(&t, &d, i * 100 * MS) {
                clicks.push((i, p));
            }
        }
        assert_eq!(clicks, vec![(10, AimPoint::CENTER)]);
        assert_eq!(dwell.state(), DwellState::Idle);
    }

    #[test]
    fn test_backwards_timestamp_does_not_underflow() {
        let mut dwell = DwellActivation::new(1000 * MS);
        let (t, d) = still();
        dwell.update(&t, &d, 500 * MS);
        assert!(dwell.update(&t, &d, 100 * MS).is_none());
        assert_eq!(dwell.state().progress(), 0.0);
    }

    #[test]
    fn test_feedback_from_progress() {
        let idle = DwellFeedback::from_progress(0.05);
        assert_eq!(idle.crosshair_scale, 1.0);
        assert_eq!(idle.ring_alpha, 10);

        let half = DwellFeedback::from_progress(0.5);
        assert_eq!(half.sweep_degrees, 180.0);
        assert_eq!(half.ring_alpha, 100);
        assert!((half.crosshair_scale - 1.15).abs() < 1e-12);
    }
}
