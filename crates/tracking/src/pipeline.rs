//! One synchronous aim pass per input.
//!
//! `AimPipeline` owns every piece of per-session tracking state and is the
//! single writer for all of it. Each call to [`AimPipeline::process`] runs
//! a complete pass and returns the events it produced, so a reader never
//! observes a half-updated aim.
//!
//! Per continuous sample, in order:
//! sampler -> calibration observe -> integrator -> smoother -> dwell.

use headaim_common::config::{AppConfig, CalibrationRecord, ControllerAxisMode};
use headaim_common::error::{HeadaimError, HeadaimResult};
use headaim_model::aim::{AimPoint, AimSnapshot};
use headaim_model::calibration::CalibrationOffset;
use headaim_model::event::{AimEvent, AimEventKind, ClickSource};
use headaim_model::sample::{
    AngularSample, ControllerPayload, RawInput, TimedInput, TimestampNs, TouchPhase,
};
use headaim_model::session::SessionMode;
use headaim_input::sampler::OrientationSampler;

use crate::calibration::{CalibrationEngine, CalibrationState, CalibrationStep};
use crate::dwell::{DwellActivation, DwellFeedback};
use crate::integrator::MotionIntegrator;
use crate::smoother::{feedback_alpha, AimSmoother, EyeViewport};

/// The per-session aim core.
#[derive(Debug, Clone)]
pub struct AimPipeline {
    mode: SessionMode,
    auto_calibrate: bool,
    sampler: OrientationSampler,
    calibration: CalibrationEngine,
    integrator: MotionIntegrator,
    smoother: AimSmoother,
    dwell: DwellActivation,
    eye: EyeViewport,
    last_sample: Option<AngularSample>,
    last_timestamp: TimestampNs,
    completed_record: Option<CalibrationRecord>,
}

impl AimPipeline {
    /// Build a pipeline for `mode`. A complete saved calibration in
    /// `config` is applied immediately.
    pub fn new(mode: SessionMode, config: &AppConfig) -> HeadaimResult<Self> {
        config.validate()?;

        let sampler = OrientationSampler::new(mode, config.input.controller_axis_mode)
            .with_unit_scale(config.input.gyro_unit_scale);
        let mut calibration =
            CalibrationEngine::new(config.input.countdown_ticks, config.input.haptic_feedback)
                .with_head_limits(config.tracking.yaw_limit_deg, config.tracking.pitch_limit_deg);
        let mut integrator = MotionIntegrator::new(config.tracking.sensitivity);

        match mode {
            SessionMode::SensorDriven => {
                if let Some(offset) = calibration.load(&config.calibration) {
                    integrator.calibrate(offset);
                }
            }
            SessionMode::ControllerDriven => integrator.calibrate(CalibrationOffset::ZERO),
            SessionMode::TouchDriven => {}
        }

        tracing::info!(
            mode = %mode,
            calibrated = integrator.is_calibrated(),
            sensitivity = config.tracking.sensitivity,
            smoothing = config.tracking.smoothing,
            "Aim pipeline ready"
        );

        Ok(Self {
            mode,
            auto_calibrate: config.input.auto_calibrate,
            sampler,
            calibration,
            integrator,
            smoother: AimSmoother::new(config.tracking.smoothing),
            dwell: DwellActivation::from_secs(config.tracking.hold_duration_secs),
            eye: EyeViewport::from(&config.display),
            last_sample: None,
            last_timestamp: 0,
            completed_record: None,
        })
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn target(&self) -> AimPoint {
        self.integrator.target()
    }

    pub fn displayed(&self) -> AimPoint {
        self.smoother.displayed()
    }

    pub fn is_calibrated(&self) -> bool {
        self.integrator.is_calibrated()
    }

    pub fn calibration_state(&self) -> CalibrationState {
        self.calibration.state()
    }

    pub fn calibration(&self) -> &CalibrationEngine {
        &self.calibration
    }

    /// Whether the session should start a guided calibration right away.
    pub fn needs_calibration(&self) -> bool {
        self.mode == SessionMode::SensorDriven
            && self.auto_calibrate
            && !self.integrator.is_calibrated()
            && !self.calibration.is_calibrating()
    }

    /// Timestamp of the newest input processed; 0 before the first one.
    pub fn last_timestamp(&self) -> TimestampNs {
        self.last_timestamp
    }

    /// Committed aim state.
    pub fn snapshot(&self) -> AimSnapshot {
        let displayed = self.smoother.displayed();
        AimSnapshot {
            mode: self.mode,
            target: self.integrator.target(),
            displayed,
            dwell_progress: if self.mode.uses_dwell() {
                self.dwell.state().progress()
            } else {
                0.0
            },
            calibrated: self.integrator.is_calibrated(),
            calibrating: self.calibration.is_calibrating(),
            crosshair_origin: self.eye.crosshair_origin(&displayed),
            timestamp_ns: self.last_timestamp,
        }
    }

    /// Progress ring hints for the current dwell.
    pub fn dwell_feedback(&self) -> DwellFeedback {
        DwellFeedback::from_progress(self.snapshot().dwell_progress)
    }

    /// Crosshair opacity for the current target/displayed gap.
    pub fn crosshair_alpha(&self) -> f64 {
        feedback_alpha(self.smoother.displayed().l1_distance(&self.integrator.target()))
    }

    /// Run one full pass for an input.
    pub fn process(&mut self, input: &TimedInput) -> Vec<AimEvent> {
        let now = input.timestamp_ns;
        self.last_timestamp = now;

        match &input.input {
            RawInput::Accelerometer { .. } | RawInput::Magnetometer { .. } => {
                self.calibration.observe_reference(&input.input);
                return Vec::new();
            }
            RawInput::Touch { phase, x, y } => return self.handle_touch(*phase, *x, *y, now),
            RawInput::Gyro { .. } | RawInput::Controller(_) => {}
        }

        let mut events = Vec::new();

        if let RawInput::Controller(payload) = &input.input {
            if let Some(click) = self.controller_click(payload, now) {
                events.push(click);
            }
        }

        let Some(sample) = self.sampler.normalize(input) else {
            return events;
        };

        self.calibration.observe(&sample);
        self.last_sample = Some(sample);

        let target = self.integrator.integrate(&sample);
        let displayed = self.smoother.step(&target);

        if self.dwell_active() {
            if let Some(point) = self.dwell.update(&target, &displayed, now) {
                events.push(AimEvent::click(now, point.x, point.y, ClickSource::Dwell));
            }
        }

        events
    }

    fn dwell_active(&self) -> bool {
        self.mode.uses_dwell()
            && self.integrator.is_calibrated()
            && !self.calibration.is_calibrating()
    }

    /// Every controller payload with a button flag set clicks at center.
    fn controller_click(&self, payload: &ControllerPayload, now: TimestampNs) -> Option<AimEvent> {
        if self.mode != SessionMode::ControllerDriven
            || self.sampler.axis_mode() != ControllerAxisMode::Angular
        {
            return None;
        }

        payload.any_button().then(|| {
            AimEvent::click(
                now,
                AimPoint::CENTER.x,
                AimPoint::CENTER.y,
                ClickSource::Controller,
            )
        })
    }

    fn handle_touch(&mut self, phase: TouchPhase, x: f64, y: f64, now: TimestampNs) -> Vec<AimEvent> {
        if self.mode != SessionMode::TouchDriven || !x.is_finite() || !y.is_finite() {
            return Vec::new();
        }

        match phase {
            TouchPhase::Down => {
                let point = AimPoint::new(x, y).clamped(0.0, 1.0);
                tracing::debug!(x = point.x, y = point.y, "Touch click");
                vec![AimEvent::click(now, point.x, point.y, ClickSource::Touch)]
            }
            TouchPhase::Move => {
                self.integrator.set_target(AimPoint::new(x, y));
                self.smoother.snap(self.integrator.target());
                Vec::new()
            }
            TouchPhase::Up => Vec::new(),
        }
    }

    /// Start the guided calibration. Sensor-driven sessions only.
    pub fn begin_calibration(&mut self, now: TimestampNs) -> HeadaimResult<Vec<AimEvent>> {
        if self.mode != SessionMode::SensorDriven {
            return Err(HeadaimError::calibration(format!(
                "calibration is not available in {} mode",
                self.mode
            )));
        }
        self.dwell.reset();
        let step = self.calibration.begin(now)?;
        Ok(self.apply(step))
    }

    /// Advance the calibration countdown by one step.
    pub fn tick_calibration(&mut self, now: TimestampNs) -> Vec<AimEvent> {
        let step = self.calibration.tick(now);
        self.apply(step)
    }

    /// Capture the current pose without waiting for the countdown.
    pub fn capture_pose(&mut self, now: TimestampNs) -> HeadaimResult<Vec<AimEvent>> {
        let step = self.calibration.capture(now)?;
        Ok(self.apply(step))
    }

    /// Finish the calibration early with what has been captured.
    pub fn complete_calibration(&mut self, now: TimestampNs) -> HeadaimResult<Vec<AimEvent>> {
        if !self.calibration.is_calibrating() {
            return Err(HeadaimError::calibration("no calibration in progress"));
        }
        let step = self.calibration.complete(now);
        Ok(self.apply(step))
    }

    pub fn abort_calibration(&mut self, now: TimestampNs) -> Vec<AimEvent> {
        let step = self.calibration.abort(now);
        self.apply(step)
    }

    fn apply(&mut self, step: CalibrationStep) -> Vec<AimEvent> {
        if let Some(offset) = step.offset {
            self.integrator.calibrate(offset);
            self.reset_aim();
        }
        if let Some(result) = step.result {
            self.completed_record = result.record;
        }
        step.events
    }

    /// Re-anchor the aim on the latest sample and center it.
    pub fn recenter(&mut self, now: TimestampNs) -> HeadaimResult<Vec<AimEvent>> {
        match self.mode {
            SessionMode::SensorDriven => {
                let sample = self
                    .last_sample
                    .ok_or_else(|| HeadaimError::tracking("no sample to recenter on"))?;
                self.integrator.recenter(&sample);
                self.calibration.set_offset(CalibrationOffset::from_sample(&sample));
            }
            SessionMode::ControllerDriven | SessionMode::TouchDriven => {
                self.integrator.reset_target();
            }
        }
        self.reset_aim();
        tracing::info!(mode = %self.mode, "Aim recentered");
        Ok(vec![AimEvent::new(now, AimEventKind::Recentered)])
    }

    fn reset_aim(&mut self) {
        self.integrator.reset_target();
        self.smoother.snap(AimPoint::CENTER);
        self.dwell.reset();
    }

    /// Record of a calibration completed since the last call, for the
    /// owner to persist. Center-only fallbacks never show up here.
    pub fn take_completed_record(&mut self) -> Option<CalibrationRecord> {
        self.completed_record.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use headaim_model::calibration::CalibrationPose;

    fn config() -> AppConfig {
        AppConfig::default()
    }

    fn calibrated_sensor() -> AimPipeline {
        calibrated_sensor_with(&config())
    }

    fn calibrated_sensor_with(cfg: &AppConfig) -> AimPipeline {
        let mut pipeline = AimPipeline::new(SessionMode::SensorDriven, cfg).unwrap();
        pipeline.process(&TimedInput::gyro(0, 0.0, 0.0, 0.0));
        pipeline.begin_calibration(0).unwrap();
        pipeline.capture_pose(0).unwrap();
        pipeline.complete_calibration(0).unwrap();
        pipeline
    }

    #[test]
    fn test_new_rejects_invalid_tracking_config() {
        let mut cfg = config();
        cfg.tracking.smoothing = 1.5;
        assert!(AimPipeline::new(SessionMode::SensorDriven, &cfg).is_err());
    }

    #[test]
    fn test_new_rejects_invalid_display_config() {
        let mut cfg = config();
        cfg.display.crosshair_height_px = 5000.0;
        assert!(AimPipeline::new(SessionMode::TouchDriven, &cfg).is_err());
    }

    #[test]
    fn test_gyro_unit_scale_applies_to_sensor_rates() {
        let mut scaled_cfg = config();
        scaled_cfg.input.gyro_unit_scale = 2.0;
        let mut scaled = calibrated_sensor_with(&scaled_cfg);
        let mut plain = calibrated_sensor();

        scaled.process(&TimedInput::gyro(10, 0.05, 0.0, 0.0));
        plain.process(&TimedInput::gyro(10, 0.1, 0.0, 0.0));

        assert!(scaled.target().x < 0.5);
        assert_eq!(scaled.target(), plain.target());
    }

    #[test]
    fn test_snapshot_places_crosshair_in_configured_eye() {
        let mut cfg = config();
        cfg.display.eye_width_px = 100.0;
        cfg.display.eye_height_px = 200.0;
        cfg.display.crosshair_width_px = 10.0;
        cfg.display.crosshair_height_px = 10.0;
        let mut pipeline = AimPipeline::new(SessionMode::TouchDriven, &cfg).unwrap();
        assert_eq!(pipeline.snapshot().crosshair_origin, (45.0, 95.0));

        pipeline.process(&TimedInput::touch(3, TouchPhase::Move, 0.0, 1.0));
        let snapshot = pipeline.snapshot();
        assert_eq!(
            snapshot.crosshair_origin,
            EyeViewport::from(&cfg.display).crosshair_origin(&snapshot.displayed)
        );
        assert!(snapshot.crosshair_origin.0 >= 0.0);
        assert!(snapshot.crosshair_origin.1 <= 190.0);
    }

    #[test]
    fn test_last_timestamp_follows_inputs() {
        let mut pipeline = AimPipeline::new(SessionMode::TouchDriven, &config()).unwrap();
        assert_eq!(pipeline.last_timestamp(), 0);
        pipeline.process(&TimedInput::touch(42, TouchPhase::Move, 0.3, 0.3));
        assert_eq!(pipeline.last_timestamp(), 42);
    }

    #[test]
    fn test_fresh_sensor_session_needs_calibration() {
        let pipeline = AimPipeline::new(SessionMode::SensorDriven, &config()).unwrap();
        assert!(pipeline.needs_calibration());
        assert!(!pipeline.snapshot().calibrated);

        let controller = AimPipeline::new(SessionMode::ControllerDriven, &config()).unwrap();
        assert!(!controller.needs_calibration());
        assert!(controller.snapshot().calibrated);
    }

    #[test]
    fn test_saved_calibration_is_applied() {
        let mut cfg = config();
        cfg.calibration = CalibrationRecord::complete([
            [0.1, 0.0, 0.0],
            [0.1, -0.5, 0.0],
            [0.1, 0.5, 0.0],
            [0.5, 0.0, 0.0],
            [-0.3, 0.0, 0.0],
        ]);
        let mut pipeline = AimPipeline::new(SessionMode::SensorDriven, &cfg).unwrap();
        assert!(pipeline.is_calibrated());
        assert!(!pipeline.needs_calibration());

        // The saved center rate is the rest reference.
        pipeline.process(&TimedInput::gyro(0, 0.1, 0.0, 0.0));
        assert_eq!(pipeline.target(), AimPoint::CENTER);
    }

    #[test]
    fn test_uncalibrated_sensor_does_not_dwell() {
        let mut pipeline = AimPipeline::new(SessionMode::SensorDriven, &config()).unwrap();
        let clicks = (0..400u64)
            .flat_map(|i| pipeline.process(&TimedInput::gyro(i * 20_000_000, 0.0, 0.0, 0.0)))
            .filter(AimEvent::is_click)
            .count();
        assert_eq!(clicks, 0);
    }

    #[test]
    fn test_completion_resets_aim() {
        let mut pipeline = AimPipeline::new(SessionMode::SensorDriven, &config()).unwrap();
        pipeline.process(&TimedInput::gyro(0, 0.0, 0.0, 0.0));
        pipeline.begin_calibration(0).unwrap();
        pipeline.capture_pose(0).unwrap();
        for t in 1..20 {
            pipeline.process(&TimedInput::gyro(t, 0.3, 0.0, 0.0));
        }
        assert_ne!(pipeline.target(), AimPoint::CENTER);

        let events = pipeline.complete_calibration(20).unwrap();
        assert!(events.contains(&AimEvent::new(
            20,
            AimEventKind::CalibrationCompleted { degenerate: true }
        )));
        assert_eq!(pipeline.target(), AimPoint::CENTER);
        assert_eq!(pipeline.displayed(), AimPoint::CENTER);
        assert!(pipeline.take_completed_record().is_none());
    }

    #[test]
    fn test_full_calibration_yields_record_once() {
        let mut pipeline = AimPipeline::new(SessionMode::SensorDriven, &config()).unwrap();
        pipeline.begin_calibration(0).unwrap();
        for pose in CalibrationPose::ALL {
            pipeline.process(&TimedInput::gyro(pose.index() as u64, 0.0, 0.0, 0.0));
            pipeline.capture_pose(pose.index() as u64).unwrap();
        }
        assert_eq!(pipeline.calibration_state(), CalibrationState::Completed);
        assert!(pipeline.take_completed_record().is_some());
        assert!(pipeline.take_completed_record().is_none());
    }

    #[test]
    fn test_calibration_refused_outside_sensor_mode() {
        let mut pipeline = AimPipeline::new(SessionMode::TouchDriven, &config()).unwrap();
        assert!(matches!(
            pipeline.begin_calibration(0),
            Err(HeadaimError::Calibration { .. })
        ));
    }

    #[test]
    fn test_controller_clicks_center_for_each_pressed_payload() {
        let mut pipeline = AimPipeline::new(SessionMode::ControllerDriven, &config()).unwrap();
        let pressed = ControllerPayload {
            gx: 0.3,
            up: true,
            ..Default::default()
        };

        for t in 0..3 {
            assert_eq!(
                pipeline.process(&TimedInput::controller(t, pressed)),
                vec![AimEvent::click(t, 0.5, 0.5, ClickSource::Controller)]
            );
        }
        assert!(pipeline
            .process(&TimedInput::controller(3, ControllerPayload::default()))
            .is_empty());
    }

    #[test]
    fn test_discrete_controller_flags_steer_without_clicking() {
        let mut cfg = config();
        cfg.input.controller_axis_mode = ControllerAxisMode::Discrete;
        let mut pipeline = AimPipeline::new(SessionMode::ControllerDriven, &cfg).unwrap();
        let left = ControllerPayload {
            left: true,
            ..Default::default()
        };
        assert!(pipeline.process(&TimedInput::controller(0, left)).is_empty());
        assert!(pipeline.target().x < 0.5);
    }

    #[test]
    fn test_controller_mode_never_dwells() {
        let mut pipeline = AimPipeline::new(SessionMode::ControllerDriven, &config()).unwrap();
        for i in 0..400u64 {
            let events =
                pipeline.process(&TimedInput::controller(i * 20_000_000, ControllerPayload::default()));
            assert!(events.is_empty());
        }
        assert_eq!(pipeline.snapshot().dwell_progress, 0.0);
    }

    #[test]
    fn test_touch_down_clicks_and_move_drags() {
        let mut pipeline = AimPipeline::new(SessionMode::TouchDriven, &config()).unwrap();

        let events = pipeline.process(&TimedInput::touch(5, TouchPhase::Down, 0.3, 0.7));
        assert_eq!(events, vec![AimEvent::click(5, 0.3, 0.7, ClickSource::Touch)]);

        assert!(pipeline
            .process(&TimedInput::touch(6, TouchPhase::Move, 0.95, 0.2))
            .is_empty());
        assert_eq!(pipeline.target(), AimPoint::new(0.9, 0.2));
        assert_eq!(pipeline.displayed(), AimPoint::new(0.9, 0.2));

        assert!(pipeline
            .process(&TimedInput::touch(7, TouchPhase::Up, 0.9, 0.2))
            .is_empty());
    }

    #[test]
    fn test_touch_ignored_in_sensor_mode() {
        let mut pipeline = calibrated_sensor();
        assert!(pipeline
            .process(&TimedInput::touch(0, TouchPhase::Down, 0.3, 0.3))
            .is_empty());
    }

    #[test]
    fn test_recenter_requires_sample() {
        let mut pipeline = AimPipeline::new(SessionMode::SensorDriven, &config()).unwrap();
        assert!(pipeline.recenter(0).is_err());

        let mut pipeline = calibrated_sensor();
        for t in 1..10 {
            pipeline.process(&TimedInput::gyro(t, 0.2, 0.2, 0.0));
        }
        let events = pipeline.recenter(10).unwrap();
        assert_eq!(events, vec![AimEvent::new(10, AimEventKind::Recentered)]);
        assert_eq!(pipeline.target(), AimPoint::CENTER);

        // The drifting rate is now the rest reference.
        pipeline.process(&TimedInput::gyro(11, 0.2, 0.2, 0.0));
        assert_eq!(pipeline.target(), AimPoint::CENTER);
    }

    #[test]
    fn test_reference_inputs_do_not_move_aim() {
        let mut pipeline = calibrated_sensor();
        let events = pipeline.process(&TimedInput::new(
            5,
            RawInput::Accelerometer {
                x: 0.0,
                y: 0.0,
                z: 9.81,
            },
        ));
        assert!(events.is_empty());
        assert_eq!(pipeline.target(), AimPoint::CENTER);
        assert_eq!(pipeline.snapshot().timestamp_ns, 5);
    }

    #[test]
    fn test_crosshair_alpha_tracks_gap() {
        let mut pipeline = AimPipeline::new(SessionMode::TouchDriven, &config()).unwrap();
        assert_eq!(pipeline.crosshair_alpha(), 1.0);
        pipeline.process(&TimedInput::touch(0, TouchPhase::Move, 0.2, 0.2));
        assert_eq!(pipeline.crosshair_alpha(), 1.0);
        assert_eq!(pipeline.dwell_feedback().sweep_degrees, 0.0);
    }
}
