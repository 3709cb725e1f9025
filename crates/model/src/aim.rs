//! Aim point types.
//!
//! All coordinates are normalized: `(0.0, 0.0)` is the top-left and
//! `(1.0, 1.0)` the bottom-right of one eye's viewport.

use serde::{Deserialize, Serialize};

use crate::sample::TimestampNs;
use crate::session::SessionMode;

/// A normalized aim position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AimPoint {
    pub x: f64,
    pub y: f64,
}

impl AimPoint {
    /// Viewport center, where every session starts and every recenter lands.
    pub const CENTER: AimPoint = AimPoint { x: 0.5, y: 0.5 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Manhattan (L1) distance, the metric used for stability and
    /// adaptive smoothing.
    pub fn l1_distance(&self, other: &AimPoint) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Clamp both axes into `[min, max]`.
    pub fn clamped(&self, min: f64, max: f64) -> AimPoint {
        AimPoint {
            x: self.x.clamp(min, max),
            y: self.y.clamp(min, max),
        }
    }

    /// Whether both axes lie within `[min, max]`.
    pub fn within(&self, min: f64, max: f64) -> bool {
        (min..=max).contains(&self.x) && (min..=max).contains(&self.y)
    }
}

impl Default for AimPoint {
    fn default() -> Self {
        Self::CENTER
    }
}

/// Committed aim state published after every pipeline pass.
///
/// Readers (render loop, progress ring) only ever see whole snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AimSnapshot {
    pub mode: SessionMode,
    pub target: AimPoint,
    pub displayed: AimPoint,
    /// Dwell progress in `[0, 1]`; always 0 outside sensor-driven mode.
    pub dwell_progress: f64,
    pub calibrated: bool,
    pub calibrating: bool,
    /// Top-left pixel of the crosshair marker inside one eye's viewport.
    pub crosshair_origin: (f64, f64),
    pub timestamp_ns: TimestampNs,
}
