//! Gravity/geomagnetic reference orientation.
//!
//! Captured once, together with the Center calibration pose, from the
//! latest accelerometer and magnetometer readings. The per-tick aim loop
//! never reads it.

use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};

/// Standard gravity (m/s^2).
pub const STANDARD_GRAVITY: f64 = 9.81;

/// Below this fraction of `g` squared the device is treated as in free fall.
const FREE_FALL_RATIO_SQUARED: f64 = 0.01;

/// Minimum magnitude of `E x A`. Smaller values mean the field is almost
/// parallel to gravity (near a magnetic pole) or absent.
const MIN_HORIZONTAL_FIELD: f64 = 0.1;

/// Euler angles in radians: azimuth about -Z, pitch about X, roll about Y.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ReferenceOrientation {
    pub azimuth: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl ReferenceOrientation {
    /// Orientation of a phone mounted landscape in a viewer, from raw
    /// accelerometer and magnetometer readings in device coordinates.
    ///
    /// Returns `None` in free fall, in a degenerate magnetic field, or for
    /// non-finite readings.
    pub fn from_sensors(gravity: [f64; 3], geomagnetic: [f64; 3]) -> Option<Self> {
        let matrix = rotation_matrix(DVec3::from_array(gravity), DVec3::from_array(geomagnetic))?;
        Some(Self::from_matrix(&remap_landscape(&matrix)))
    }

    /// Euler angles of a rotation matrix whose rows are the world East,
    /// North and Up axes expressed in device coordinates.
    pub fn from_matrix(matrix: &DMat3) -> Self {
        let east = matrix.row(0);
        let north = matrix.row(1);
        let up = matrix.row(2);
        Self {
            azimuth: east.y.atan2(north.y),
            pitch: (-up.y).clamp(-1.0, 1.0).asin(),
            roll: (-up.x).atan2(up.z),
        }
    }

    /// Clamp azimuth and pitch to symmetric head-movement limits.
    pub fn limited(&self, yaw_limit_deg: f64, pitch_limit_deg: f64) -> Self {
        let yaw_limit = yaw_limit_deg.abs().to_radians();
        let pitch_limit = pitch_limit_deg.abs().to_radians();
        Self {
            azimuth: self.azimuth.clamp(-yaw_limit, yaw_limit),
            pitch: self.pitch.clamp(-pitch_limit, pitch_limit),
            roll: self.roll,
        }
    }

    /// `[azimuth, pitch, roll]` in degrees.
    pub fn to_degrees(&self) -> [f64; 3] {
        [
            self.azimuth.to_degrees(),
            self.pitch.to_degrees(),
            self.roll.to_degrees(),
        ]
    }
}

/// World-from-device rotation with rows East, North, Up.
pub fn rotation_matrix(gravity: DVec3, geomagnetic: DVec3) -> Option<DMat3> {
    if !gravity.is_finite() || !geomagnetic.is_finite() {
        return None;
    }
    let free_fall = FREE_FALL_RATIO_SQUARED * STANDARD_GRAVITY * STANDARD_GRAVITY;
    if gravity.length_squared() < free_fall {
        return None;
    }

    let east = geomagnetic.cross(gravity);
    let east_norm = east.length();
    if east_norm < MIN_HORIZONTAL_FIELD {
        return None;
    }

    let east = east / east_norm;
    let up = gravity.normalize();
    let north = up.cross(east);

    Some(DMat3::from_cols(east, north, up).transpose())
}

/// Swap device axes for landscape viewer mounting: the device Z axis
/// becomes X and the device X axis becomes Y.
pub fn remap_landscape(matrix: &DMat3) -> DMat3 {
    DMat3::from_cols(matrix.z_axis, matrix.x_axis, matrix.y_axis)
}
