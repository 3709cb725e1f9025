//! Adaptive smoothing of the displayed aim point.
//!
//! Each tick the displayed point moves toward the target by
//! `(1 - smoothing) * adaptive`, where `adaptive = min(1.5, 1 + 2 * gap)`
//! and `gap` is the L1 distance between the two. Large gaps close faster so
//! quick head turns do not lag, while small corrections stay smooth.

use headaim_common::config::DisplayConfig;
use headaim_model::aim::AimPoint;

/// Upper bound of the adaptive speed-up.
pub const MAX_ADAPTIVE_FACTOR: f64 = 1.5;

/// Gap-to-speed-up slope.
pub const ADAPTIVE_SLOPE: f64 = 2.0;

/// Minimum crosshair opacity while moving.
pub const MIN_FEEDBACK_ALPHA: f64 = 0.7;

/// Low-pass filter from `target` to `displayed`.
#[derive(Debug, Clone)]
pub struct AimSmoother {
    smoothing: f64,
    displayed: AimPoint,
}

impl AimSmoother {
    /// `smoothing` in `[0, 1)`: 0 follows the target immediately, values
    /// near 1 follow slowly.
    pub fn new(smoothing: f64) -> Self {
        Self {
            smoothing: smoothing.clamp(0.0, 0.99),
            displayed: AimPoint::CENTER,
        }
    }

    pub fn displayed(&self) -> AimPoint {
        self.displayed
    }

    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }

    /// Jump straight to a point (calibration reset, recenter, touch).
    pub fn snap(&mut self, point: AimPoint) {
        self.displayed = point;
    }

    /// Advance one tick toward `target`.
    pub fn step(&mut self, target: &AimPoint) -> AimPoint {
        let lerp = 1.0 - self.smoothing;
        let adaptive = adaptive_factor(self.displayed.l1_distance(target));
        let k = lerp * adaptive;

        self.displayed = AimPoint::new(
            self.displayed.x + (target.x - self.displayed.x) * k,
            self.displayed.y + (target.y - self.displayed.y) * k,
        );
        self.displayed
    }
}

/// Speed-up for a given L1 gap.
pub fn adaptive_factor(distance: f64) -> f64 {
    (1.0 + distance * ADAPTIVE_SLOPE).min(MAX_ADAPTIVE_FACTOR)
}

/// Crosshair opacity for a given L1 gap. Rendering hint only.
pub fn feedback_alpha(distance: f64) -> f64 {
    (1.0 - distance * 3.0).clamp(MIN_FEEDBACK_ALPHA, 1.0)
}

/// One eye's viewport in pixels, plus the crosshair marker size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeViewport {
    pub width: f64,
    pub height: f64,
    pub marker_width: f64,
    pub marker_height: f64,
}

impl EyeViewport {
    pub fn new(width: f64, height: f64, marker_width: f64, marker_height: f64) -> Self {
        Self {
            width,
            height,
            marker_width,
            marker_height,
        }
    }

    /// Top-left pixel position for the crosshair marker centred on
    /// `displayed`, kept fully inside the viewport.
    pub fn crosshair_origin(&self, displayed: &AimPoint) -> (f64, f64) {
        let x = displayed.x * self.width - self.marker_width / 2.0;
        let y = displayed.y * self.height - self.marker_height / 2.0;
        (
            x.min(self.width - self.marker_width).max(0.0),
            y.min(self.height - self.marker_height).max(0.0),
        )
    }
}

impl From<&DisplayConfig> for EyeViewport {
    fn from(display: &DisplayConfig) -> Self {
        Self::new(
            display.eye_width_px,
            display.eye_height_px,
            display.crosshair_width_px,
            display.crosshair_height_px,
        )
    }
}
