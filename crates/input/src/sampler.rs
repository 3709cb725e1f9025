//! Normalization of raw input into angular samples.
//!
//! The tracking pipeline only ever sees `AngularSample`. This module maps
//! onboard gyro triples and external-controller payloads into that shape,
//! and drops anything that does not belong to the session's mode or does
//! not carry finite numbers.

use headaim_common::config::ControllerAxisMode;
use headaim_model::sample::{AngularSample, ControllerPayload, RawInput, TimedInput};
use headaim_model::session::SessionMode;

/// Rate (rad/s) a discrete controller flag stands for. Large enough that
/// the integrator's per-tick delta saturates at default sensitivity.
pub const CONTROLLER_FULL_SCALE: f64 = 0.25;

/// Converts raw input for one session into angular samples.
#[derive(Debug, Clone)]
pub struct OrientationSampler {
    mode: SessionMode,
    axis_mode: ControllerAxisMode,
    /// Multiplier bringing onboard gyro readings to rad/s.
    unit_scale: f64,
}

impl OrientationSampler {
    pub fn new(mode: SessionMode, axis_mode: ControllerAxisMode) -> Self {
        Self {
            mode,
            axis_mode,
            unit_scale: 1.0,
        }
    }

    /// Scale applied to onboard gyro axes (e.g. `PI / 180` for deg/s sensors).
    pub fn with_unit_scale(mut self, unit_scale: f64) -> Self {
        self.unit_scale = unit_scale;
        self
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn axis_mode(&self) -> ControllerAxisMode {
        self.axis_mode
    }

    /// Normalize one input. Returns `None` for inputs that carry no angular
    /// rate for this session, and for non-finite readings.
    pub fn normalize(&self, input: &TimedInput) -> Option<AngularSample> {
        let t = input.timestamp_ns;
        let sample = match (self.mode, &input.input) {
            (SessionMode::SensorDriven, RawInput::Gyro { x, y, z }) => AngularSample::new(
                x * self.unit_scale,
                y * self.unit_scale,
                z * self.unit_scale,
                t,
            ),
            (SessionMode::ControllerDriven, RawInput::Controller(payload)) => {
                match self.axis_mode {
                    ControllerAxisMode::Angular => {
                        AngularSample::new(payload.gx, payload.gy, payload.gz, t)
                    }
                    ControllerAxisMode::Discrete => discrete_sample(payload, t),
                }
            }
            _ => return None,
        };

        if !sample.is_finite() {
            tracing::trace!(timestamp_ns = t, "Dropping non-finite sample");
            return None;
        }
        Some(sample)
    }
}

/// Map the four direction flags to fixed-magnitude rates. Opposing flags
/// cancel out.
fn discrete_sample(payload: &ControllerPayload, timestamp_ns: u64) -> AngularSample {
    let axis = |positive: bool, negative: bool| {
        (positive as i8 - negative as i8) as f64 * CONTROLLER_FULL_SCALE
    };
    // Positive roll moves the aim left, positive pitch moves it down.
    AngularSample::new(
        axis(payload.left, payload.right),
        axis(payload.down, payload.up),
        0.0,
        timestamp_ns,
    )
}
