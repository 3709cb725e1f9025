//! Calibration poses, sets, and the baseline offset.

use serde::{Deserialize, Serialize};

use crate::sample::AngularSample;

/// Number of poses in the guided calibration.
pub const POSE_COUNT: usize = 5;

/// Minimum response range for a direction pose to be usable.
pub const MIN_RESPONSE_RANGE: f64 = 0.1;

/// One of the five fixed calibration roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationPose {
    Center,
    Up,
    Down,
    Left,
    Right,
}

impl CalibrationPose {
    /// All poses in capture order.
    pub const ALL: [CalibrationPose; POSE_COUNT] = [
        CalibrationPose::Center,
        CalibrationPose::Up,
        CalibrationPose::Down,
        CalibrationPose::Left,
        CalibrationPose::Right,
    ];

    pub fn index(&self) -> usize {
        match self {
            CalibrationPose::Center => 0,
            CalibrationPose::Up => 1,
            CalibrationPose::Down => 2,
            CalibrationPose::Left => 3,
            CalibrationPose::Right => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The pose captured after this one, if any.
    pub fn next(&self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn label(&self) -> &'static str {
        match self {
            CalibrationPose::Center => "CENTER",
            CalibrationPose::Up => "UP",
            CalibrationPose::Down => "DOWN",
            CalibrationPose::Left => "LEFT",
            CalibrationPose::Right => "RIGHT",
        }
    }

    /// What the user is asked to do for this pose.
    pub fn instruction(&self) -> &'static str {
        match self {
            CalibrationPose::Center => "Look straight ahead at CENTER",
            CalibrationPose::Up => "Tilt head UP (look at ceiling)",
            CalibrationPose::Down => "Tilt head DOWN (look at floor)",
            CalibrationPose::Left => "Turn head LEFT (comfortable angle)",
            CalibrationPose::Right => "Turn head RIGHT (comfortable angle)",
        }
    }

    pub fn tip(&self) -> &'static str {
        match self {
            CalibrationPose::Center => "Keep head level and look forward",
            CalibrationPose::Up => "Tilt head back naturally",
            CalibrationPose::Down => "Tilt head down naturally",
            CalibrationPose::Left => "Turn left as far as comfortable",
            CalibrationPose::Right => "Turn right as far as comfortable",
        }
    }

    /// Axis index (`0` roll, `1` pitch) a direction pose measures.
    /// `None` for `Center`.
    pub fn response_axis(&self) -> Option<usize> {
        match self {
            CalibrationPose::Center => None,
            CalibrationPose::Up | CalibrationPose::Down => Some(1),
            CalibrationPose::Left | CalibrationPose::Right => Some(0),
        }
    }
}

/// Baseline rates captured in the `Center` pose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct CalibrationOffset {
    pub roll0: f64,
    pub pitch0: f64,
    pub yaw0: f64,
}

impl CalibrationOffset {
    pub const ZERO: CalibrationOffset = CalibrationOffset {
        roll0: 0.0,
        pitch0: 0.0,
        yaw0: 0.0,
    };

    pub fn from_axes(axes: [f64; 3]) -> Self {
        Self {
            roll0: axes[0],
            pitch0: axes[1],
            yaw0: axes[2],
        }
    }

    pub fn from_sample(sample: &AngularSample) -> Self {
        Self::from_axes(sample.axes())
    }

    pub fn axes(&self) -> [f64; 3] {
        [self.roll0, self.pitch0, self.yaw0]
    }
}

/// Five ordered calibration slots, filled pose by pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CalibrationSet {
    slots: [Option<[f64; 3]>; POSE_COUNT],
}

impl CalibrationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fully populated set.
    pub fn from_points(points: [[f64; 3]; POSE_COUNT]) -> Self {
        Self {
            slots: points.map(Some),
        }
    }

    /// Store axis values for a pose, replacing any earlier capture.
    pub fn record(&mut self, pose: CalibrationPose, axes: [f64; 3]) {
        self.slots[pose.index()] = Some(axes);
    }

    pub fn get(&self, pose: CalibrationPose) -> Option<[f64; 3]> {
        self.slots[pose.index()]
    }

    /// A set is valid only when all five slots are populated.
    pub fn is_valid(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn captured_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Offset derived from the `Center` slot.
    pub fn center_offset(&self) -> Option<CalibrationOffset> {
        self.get(CalibrationPose::Center)
            .map(CalibrationOffset::from_axes)
    }

    /// All five points, only if the set is valid.
    pub fn points(&self) -> Option<[[f64; 3]; POSE_COUNT]> {
        let mut out = [[0.0; 3]; POSE_COUNT];
        for (dst, slot) in out.iter_mut().zip(self.slots.iter()) {
            *dst = (*slot)?;
        }
        Some(out)
    }

    /// Signed distance between a direction pose and `Center` on the pose's
    /// response axis. `None` for `Center` or when either slot is empty.
    pub fn response_range(&self, pose: CalibrationPose) -> Option<f64> {
        let axis = pose.response_axis()?;
        let center = self.get(CalibrationPose::Center)?;
        let point = self.get(pose)?;
        Some(point[axis] - center[axis])
    }

    /// How far `current` has moved toward `pose`, as a fraction of the
    /// calibrated range, in `[-1, 1]`.
    ///
    /// Returns `0.0` when the pose is missing or its range is below
    /// [`MIN_RESPONSE_RANGE`].
    pub fn directional_delta(&self, current: [f64; 3], pose: CalibrationPose) -> f64 {
        let (Some(axis), Some(range), Some(center)) = (
            pose.response_axis(),
            self.response_range(pose),
            self.get(CalibrationPose::Center),
        ) else {
            return 0.0;
        };

        if range.abs() < MIN_RESPONSE_RANGE {
            return 0.0;
        }

        let offset = current[axis] - center[axis];
        (offset.abs() / range.abs()).clamp(0.0, 1.0) * offset.signum() * range.signum()
    }
}
