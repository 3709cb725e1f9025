//! Angular-rate integration into a normalized aim target.
//!
//! # Algorithm
//!
//! Per sample, and only once calibrated:
//!
//! 1. **Offset:** subtract the Center pose rates from roll and pitch.
//! 2. **Deadzone:** rates with magnitude below [`DEADZONE`] become exactly 0.
//! 3. **Drift decay:** multiply by [`DRIFT_DECAY`] (leaky integrator).
//! 4. **Gain:** `dx = -roll * sensitivity * GAIN`, `dy = pitch * sensitivity * GAIN`.
//! 5. **Rate limit:** clamp each delta to `±MAX_DELTA`.
//! 6. **Apply:** if either delta exceeds [`MOVE_EPSILON`], move the target
//!    and clamp it to `[AIM_MIN, AIM_MAX]`.
//!
//! The `[0.1, 0.9]` band keeps the crosshair off the viewport edge, where
//! hit-testing against content is unreliable.

use headaim_model::aim::AimPoint;
use headaim_model::calibration::CalibrationOffset;
use headaim_model::sample::AngularSample;

/// Rates below this magnitude (rad/s) are treated as rest.
pub const DEADZONE: f64 = 0.002;

/// Per-tick damping applied to the offset-corrected rate.
pub const DRIFT_DECAY: f64 = 0.98;

/// Rate-to-aim gain, multiplied with the user sensitivity.
pub const GAIN: f64 = 0.08;

/// Largest aim change per tick on either axis.
pub const MAX_DELTA: f64 = 0.02;

/// Deltas at or below this are not applied.
pub const MOVE_EPSILON: f64 = 0.001;

/// Lower bound of the aim band.
pub const AIM_MIN: f64 = 0.1;

/// Upper bound of the aim band.
pub const AIM_MAX: f64 = 0.9;

/// Integrates angular samples into the unsmoothed aim target.
#[derive(Debug, Clone)]
pub struct MotionIntegrator {
    sensitivity: f64,
    offset: Option<CalibrationOffset>,
    target: AimPoint,
}

impl MotionIntegrator {
    /// Create an uncalibrated integrator with the target at center.
    pub fn new(sensitivity: f64) -> Self {
        Self {
            sensitivity,
            offset: None,
            target: AimPoint::CENTER,
        }
    }

    /// Install a baseline offset. Integration starts with the next sample.
    pub fn calibrate(&mut self, offset: CalibrationOffset) {
        tracing::debug!(
            roll0 = offset.roll0,
            pitch0 = offset.pitch0,
            yaw0 = offset.yaw0,
            "Integrator offset set"
        );
        self.offset = Some(offset);
    }

    /// Take the current sample as the new rest reference and center the aim.
    pub fn recenter(&mut self, sample: &AngularSample) {
        self.calibrate(CalibrationOffset::from_sample(sample));
        self.target = AimPoint::CENTER;
    }

    pub fn is_calibrated(&self) -> bool {
        self.offset.is_some()
    }

    pub fn offset(&self) -> Option<CalibrationOffset> {
        self.offset
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    pub fn set_sensitivity(&mut self, sensitivity: f64) {
        self.sensitivity = sensitivity;
    }

    pub fn target(&self) -> AimPoint {
        self.target
    }

    /// Move the target back to center without touching the offset.
    pub fn reset_target(&mut self) {
        self.target = AimPoint::CENTER;
    }

    /// Place the target directly (touch drag). Clamped into the aim band.
    pub fn set_target(&mut self, point: AimPoint) {
        self.target = point.clamped(AIM_MIN, AIM_MAX);
    }

    /// Integrate one sample and return the updated target.
    ///
    /// Uncalibrated integrators and non-finite samples leave the target
    /// unchanged.
    pub fn integrate(&mut self, sample: &AngularSample) -> AimPoint {
        let Some(offset) = self.offset else {
            return self.target;
        };
        if !sample.is_finite() {
            return self.target;
        }

        let delta_x = -axis_delta(sample.roll_rate, offset.roll0, self.sensitivity);
        let delta_y = axis_delta(sample.pitch_rate, offset.pitch0, self.sensitivity);

        if delta_x.abs() > MOVE_EPSILON || delta_y.abs() > MOVE_EPSILON {
            self.target = AimPoint::new(self.target.x + delta_x, self.target.y + delta_y)
                .clamped(AIM_MIN, AIM_MAX);
        }

        self.target
    }
}

/// Aim change for one axis, before the sign convention is applied.
///
/// Deadzone, drift decay, gain and rate limit, in that order. Returns
/// exactly `0.0` when `|rate - baseline| < DEADZONE`.
pub fn axis_delta(rate: f64, baseline: f64, sensitivity: f64) -> f64 {
    let mut corrected = rate - baseline;
    if corrected.abs() < DEADZONE {
        corrected = 0.0;
    }
    corrected *= DRIFT_DECAY;
    (corrected * sensitivity * GAIN).clamp(-MAX_DELTA, MAX_DELTA)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn calibrated(sensitivity: f64) -> MotionIntegrator {
        let mut integrator = MotionIntegrator::new(sensitivity);
        integrator.calibrate(CalibrationOffset::ZERO);
        integrator
    }

    #[test]
    fn test_uncalibrated_does_not_move() {
        let mut integrator = MotionIntegrator::new(2.2);
        let target = integrator.integrate(&AngularSample::new(1.0, 1.0, 0.0, 0));
        assert_eq!(target, AimPoint::CENTER);
        assert!(!integrator.is_calibrated());
    }

    #[test]
    fn test_constant_roll_moves_left_until_band_edge() {
        let mut integrator = calibrated(2.2);
        let mut previous = integrator.target().x;
        let mut saturated_at = None;

        for tick in 0..50u64 {
            let target = integrator.integrate(&AngularSample::new(0.05, 0.0, 0.0, tick));
            assert_eq!(target.y, 0.5);
            if saturated_at.is_none() {
                if target.x == AIM_MIN {
                    saturated_at = Some(tick);
                } else {
                    assert!(target.x < previous, "tick {tick}: x did not decrease");
                }
            } else {
                assert_eq!(target.x, AIM_MIN);
            }
            previous = target.x;
        }

        // 0.4 of travel at ~0.0086 per tick.
        let saturated_at = saturated_at.expect("target should reach the band edge");
        assert!((45..=47).contains(&saturated_at), "saturated at {saturated_at}");
    }

    #[test]
    fn test_pitch_moves_down() {
        let mut integrator = calibrated(2.2);
        let target = integrator.integrate(&AngularSample::new(0.0, 0.05, 0.0, 0));
        assert!(target.y > 0.5);
        assert_eq!(target.x, 0.5);
    }

    #[test]
    fn test_offset_is_subtracted() {
        let mut integrator = MotionIntegrator::new(2.2);
        integrator.calibrate(CalibrationOffset::from_axes([0.3, -0.2, 0.0]));
        let target = integrator.integrate(&AngularSample::new(0.3, -0.2, 5.0, 0));
        assert_eq!(target, AimPoint::CENTER);
    }

    #[test]
    fn test_spike_is_rate_limited() {
        let mut integrator = calibrated(2.2);
        let target = integrator.integrate(&AngularSample::new(-1000.0, 1000.0, 0.0, 0));
        assert!((target.x - (0.5 + MAX_DELTA)).abs() < 1e-12);
        assert!((target.y - (0.5 + MAX_DELTA)).abs() < 1e-12);
    }

    #[test]
    fn test_sub_epsilon_delta_is_not_applied() {
        let mut integrator = calibrated(2.2);
        // 0.005 * 0.98 * 2.2 * 0.08 = 0.000862 < MOVE_EPSILON
        let target = integrator.integrate(&AngularSample::new(0.005, 0.0, 0.0, 0));
        assert_eq!(target, AimPoint::CENTER);
    }

    #[test]
    fn test_non_finite_sample_is_ignored() {
        let mut integrator = calibrated(2.2);
        let target = integrator.integrate(&AngularSample::new(f64::NAN, 0.0, 0.0, 0));
        assert_eq!(target, AimPoint::CENTER);
    }

    #[test]
    fn test_recenter_resets_target_and_offset() {
        let mut integrator = calibrated(2.2);
        for t in 0..10 {
            integrator.integrate(&AngularSample::new(0.1, 0.1, 0.0, t));
        }
        assert_ne!(integrator.target(), AimPoint::CENTER);

        let drifting = AngularSample::new(0.1, 0.1, 0.0, 11);
        integrator.recenter(&drifting);
        assert_eq!(integrator.target(), AimPoint::CENTER);
        assert_eq!(integrator.integrate(&drifting), AimPoint::CENTER);
    }

    proptest! {
        #[test]
        fn prop_deadzone_contributes_nothing(
            baseline in -1.0f64..1.0,
            within in -0.00199f64..0.00199,
            sensitivity in 0.1f64..10.0,
        ) {
            prop_assert_eq!(axis_delta(baseline + within, baseline, sensitivity), 0.0);
        }

        #[test]
        fn prop_target_stays_in_band(
            rates in proptest::collection::vec((-1.0e6f64..1.0e6, -1.0e6f64..1.0e6), 1..400),
            sensitivity in 0.1f64..10.0,
        ) {
            let mut integrator = calibrated(sensitivity);
            for (i, (roll, pitch)) in rates.into_iter().enumerate() {
                let target = integrator.integrate(&AngularSample::new(roll, pitch, 0.0, i as u64));
                prop_assert!(target.within(AIM_MIN, AIM_MAX), "target {:?}", target);
            }
        }

        #[test]
        fn prop_delta_never_exceeds_rate_limit(rate in -1.0e9f64..1.0e9, sensitivity in 0.0f64..100.0) {
            prop_assert!(axis_delta(rate, 0.0, sensitivity).abs() <= MAX_DELTA);
        }
    }
}
