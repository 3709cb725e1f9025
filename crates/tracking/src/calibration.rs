//! Guided five-pose calibration.
//!
//! The engine walks Center, Up, Down, Left, Right. Each pose gets a
//! countdown driven by [`CalibrationEngine::tick`] (one call per second
//! from the owner's timer) and is captured when the countdown runs out, or
//! earlier through an explicit [`CalibrationEngine::capture`].
//!
//! Center is usable on its own: capturing it hands out a provisional
//! offset straight away, so aiming works before the remaining poses are
//! done. An interrupted run never leaves the device without an offset.
//!
//! The engine does no I/O. Finished calibrations come back as a
//! [`CalibrationResult`] carrying the record to persist.

use headaim_common::config::CalibrationRecord;
use headaim_common::error::{HeadaimError, HeadaimResult};
use headaim_model::calibration::{CalibrationOffset, CalibrationPose, CalibrationSet};
use headaim_model::event::{AimEvent, AimEventKind};
use headaim_model::sample::{AngularSample, RawInput, TimestampNs};
use serde::{Deserialize, Serialize};

use crate::reference::ReferenceOrientation;

/// Default countdown length per pose, in ticks.
pub const DEFAULT_COUNTDOWN: u32 = 5;

/// Countdown values at or below this are the capture phase.
pub const CAPTURE_PHASE: u32 = 3;

/// Calibration progress.
///
/// `remaining` is the next countdown value to announce. Once it reaches
/// zero the following tick captures the pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CalibrationState {
    NotStarted,
    AwaitingPose { pose: CalibrationPose, remaining: u32 },
    Capturing { pose: CalibrationPose, remaining: u32 },
    Completed,
    Aborted,
}

impl CalibrationState {
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            CalibrationState::AwaitingPose { .. } | CalibrationState::Capturing { .. }
        )
    }

    /// Pose currently being calibrated.
    pub fn pose(&self) -> Option<CalibrationPose> {
        match self {
            CalibrationState::AwaitingPose { pose, .. } | CalibrationState::Capturing { pose, .. } => {
                Some(*pose)
            }
            _ => None,
        }
    }
}

/// A finished calibration.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationResult {
    pub offset: CalibrationOffset,
    /// Complete record to persist. `None` for a center-only fallback,
    /// which is never saved.
    pub record: Option<CalibrationRecord>,
    pub degenerate: bool,
    pub reference: Option<ReferenceOrientation>,
}

/// Everything one engine call produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationStep {
    pub events: Vec<AimEvent>,
    /// Offset the integrator should switch to.
    pub offset: Option<CalibrationOffset>,
    /// Set when the run finished with this call.
    pub result: Option<CalibrationResult>,
}

impl CalibrationStep {
    fn push(&mut self, now: TimestampNs, kind: AimEventKind) {
        self.events.push(AimEvent::new(now, kind));
    }
}

/// Guided calibration state machine.
#[derive(Debug, Clone)]
pub struct CalibrationEngine {
    state: CalibrationState,
    countdown: u32,
    haptic: bool,
    pending: CalibrationSet,
    active: Option<CalibrationSet>,
    committed: Option<CalibrationOffset>,
    provisional: Option<CalibrationOffset>,
    latest: Option<AngularSample>,
    gravity: Option<[f64; 3]>,
    geomagnetic: Option<[f64; 3]>,
    reference: Option<ReferenceOrientation>,
    limits: (f64, f64),
}

impl Default for CalibrationEngine {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTDOWN, true)
    }
}

impl CalibrationEngine {
    pub fn new(countdown: u32, haptic: bool) -> Self {
        Self {
            state: CalibrationState::NotStarted,
            countdown,
            haptic,
            pending: CalibrationSet::new(),
            active: None,
            committed: None,
            provisional: None,
            latest: None,
            gravity: None,
            geomagnetic: None,
            reference: None,
            limits: (180.0, 90.0),
        }
    }

    /// Clamp the captured reference orientation to these head limits.
    pub fn with_head_limits(mut self, yaw_limit_deg: f64, pitch_limit_deg: f64) -> Self {
        self.limits = (yaw_limit_deg, pitch_limit_deg);
        self
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }

    pub fn is_calibrating(&self) -> bool {
        self.state.is_in_progress()
    }

    pub fn is_calibrated(&self) -> bool {
        self.offset().is_some()
    }

    /// Offset in effect: the provisional Center capture while a run is
    /// active, otherwise the last committed one.
    pub fn offset(&self) -> Option<CalibrationOffset> {
        self.provisional.or(self.committed)
    }

    /// Last complete (or center-only) set.
    pub fn active_set(&self) -> Option<&CalibrationSet> {
        self.active.as_ref()
    }

    /// Set being filled by the current run.
    pub fn pending_set(&self) -> &CalibrationSet {
        &self.pending
    }

    pub fn reference(&self) -> Option<ReferenceOrientation> {
        self.reference
    }

    pub fn latest_sample(&self) -> Option<AngularSample> {
        self.latest
    }

    /// Restore a persisted calibration. Returns the offset it yields, or
    /// `None` when the record is incomplete.
    pub fn load(&mut self, record: &CalibrationRecord) -> Option<CalibrationOffset> {
        let points = record.complete_points()?;
        let set = CalibrationSet::from_points(points);
        let offset = set.center_offset();
        tracing::info!("Restored saved calibration");
        self.active = Some(set);
        self.committed = offset;
        self.state = CalibrationState::Completed;
        offset
    }

    /// Replace the committed offset (recenter).
    pub fn set_offset(&mut self, offset: CalibrationOffset) {
        self.committed = Some(offset);
        if !self.is_calibrating() {
            self.provisional = None;
        }
    }

    /// Remember the latest angular sample for capture.
    pub fn observe(&mut self, sample: &AngularSample) {
        if sample.is_finite() {
            self.latest = Some(*sample);
        }
    }

    /// Remember reference-only sensor readings (accelerometer, magnetometer).
    pub fn observe_reference(&mut self, input: &RawInput) {
        match input {
            RawInput::Accelerometer { x, y, z } => self.gravity = Some([*x, *y, *z]),
            RawInput::Magnetometer { x, y, z } => self.geomagnetic = Some([*x, *y, *z]),
            _ => {}
        }
    }

    /// Start a new run at Center.
    pub fn begin(&mut self, now: TimestampNs) -> HeadaimResult<CalibrationStep> {
        if self.is_calibrating() {
            return Err(HeadaimError::calibration("calibration already in progress"));
        }

        tracing::info!(countdown = self.countdown, "Calibration started");
        self.pending = CalibrationSet::new();
        self.provisional = None;
        self.state = CalibrationState::AwaitingPose {
            pose: CalibrationPose::Center,
            remaining: self.countdown,
        };

        let mut step = CalibrationStep::default();
        step.push(
            now,
            AimEventKind::PoseRequested {
                pose: CalibrationPose::Center,
            },
        );
        Ok(step)
    }

    /// One countdown step. Does nothing outside a run.
    pub fn tick(&mut self, now: TimestampNs) -> CalibrationStep {
        let (pose, remaining) = match self.state {
            CalibrationState::AwaitingPose { pose, remaining }
            | CalibrationState::Capturing { pose, remaining } => (pose, remaining),
            _ => return CalibrationStep::default(),
        };

        if remaining == 0 {
            return self.capture_pose(pose, now);
        }

        let capturing = remaining <= CAPTURE_PHASE;
        let mut step = CalibrationStep::default();
        step.push(
            now,
            AimEventKind::CountdownTick {
                pose,
                remaining,
                haptic: capturing && self.haptic,
            },
        );

        let remaining = remaining - 1;
        self.state = if capturing {
            CalibrationState::Capturing { pose, remaining }
        } else {
            CalibrationState::AwaitingPose { pose, remaining }
        };
        step
    }

    /// Capture the current pose now, skipping the rest of its countdown.
    pub fn capture(&mut self, now: TimestampNs) -> HeadaimResult<CalibrationStep> {
        let pose = self
            .state
            .pose()
            .ok_or_else(|| HeadaimError::calibration("no calibration in progress"))?;
        Ok(self.capture_pose(pose, now))
    }

    fn capture_pose(&mut self, pose: CalibrationPose, now: TimestampNs) -> CalibrationStep {
        let Some(sample) = self.latest else {
            tracing::debug!(pose = pose.label(), "No sample yet, deferring capture");
            self.state = CalibrationState::Capturing { pose, remaining: 0 };
            return CalibrationStep::default();
        };

        self.pending.record(pose, sample.axes());
        tracing::info!(
            pose = pose.label(),
            roll = sample.roll_rate,
            pitch = sample.pitch_rate,
            yaw = sample.yaw_rate,
            "Calibration pose captured"
        );

        let mut step = CalibrationStep::default();
        step.push(now, AimEventKind::PoseCaptured { pose });

        if pose == CalibrationPose::Center {
            let offset = CalibrationOffset::from_sample(&sample);
            self.provisional = Some(offset);
            step.offset = Some(offset);
            self.capture_reference();
        }

        match pose.next() {
            Some(next) => {
                self.state = CalibrationState::AwaitingPose {
                    pose: next,
                    remaining: self.countdown,
                };
                step.push(now, AimEventKind::PoseRequested { pose: next });
            }
            None => {
                let done = self.complete(now);
                step.events.extend(done.events);
                step.offset = done.offset;
                step.result = done.result;
            }
        }
        step
    }

    fn capture_reference(&mut self) {
        let (Some(gravity), Some(geomagnetic)) = (self.gravity, self.geomagnetic) else {
            return;
        };
        match ReferenceOrientation::from_sensors(gravity, geomagnetic) {
            Some(reference) => {
                let reference = reference.limited(self.limits.0, self.limits.1);
                tracing::debug!(degrees = ?reference.to_degrees(), "Reference orientation captured");
                self.reference = Some(reference);
            }
            None => tracing::debug!("Reference orientation unavailable"),
        }
    }

    /// Finish the run with whatever has been captured.
    ///
    /// A complete set becomes the new calibration. Anything less falls back
    /// to a center-only calibration from the most recent sample, which is
    /// applied but never persisted.
    pub fn complete(&mut self, now: TimestampNs) -> CalibrationStep {
        let mut step = CalibrationStep::default();

        let result = match self.pending.points() {
            Some(points) => {
                let offset = CalibrationOffset::from_axes(points[0]);
                self.active = Some(self.pending.clone());
                CalibrationResult {
                    offset,
                    record: Some(CalibrationRecord::complete(points)),
                    degenerate: false,
                    reference: self.reference,
                }
            }
            None => {
                let offset = self
                    .latest
                    .map(|s| CalibrationOffset::from_sample(&s))
                    .unwrap_or(CalibrationOffset::ZERO);
                tracing::warn!(
                    captured = self.pending.captured_count(),
                    "Calibration incomplete, falling back to center-only"
                );
                let mut center_only = CalibrationSet::new();
                center_only.record(CalibrationPose::Center, offset.axes());
                self.active = Some(center_only);
                CalibrationResult {
                    offset,
                    record: None,
                    degenerate: true,
                    reference: self.reference,
                }
            }
        };

        tracing::info!(degenerate = result.degenerate, "Calibration completed");
        self.committed = Some(result.offset);
        self.provisional = None;
        self.pending = CalibrationSet::new();
        self.state = CalibrationState::Completed;

        step.push(
            now,
            AimEventKind::CalibrationCompleted {
                degenerate: result.degenerate,
            },
        );
        step.offset = Some(result.offset);
        step.result = Some(result);
        step
    }

    /// Abandon the run. The previous calibration stays in effect; if there
    /// was none, a provisional Center capture is kept.
    pub fn abort(&mut self, now: TimestampNs) -> CalibrationStep {
        let mut step = CalibrationStep::default();
        if !self.is_calibrating() {
            return step;
        }

        tracing::info!(
            captured = self.pending.captured_count(),
            "Calibration aborted"
        );
        self.pending = CalibrationSet::new();
        self.state = CalibrationState::Aborted;

        if let Some(committed) = self.committed {
            if self.provisional.take().is_some() {
                step.offset = Some(committed);
            }
        } else if let Some(provisional) = self.provisional.take() {
            self.committed = Some(provisional);
        }

        step.push(now, AimEventKind::CalibrationAborted);
        step
    }
}
