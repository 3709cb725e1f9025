//! Sensor and controller input types.
//!
//! `RawInput` is whatever a collaborator hands us (platform sensors, the
//! decoded Bluetooth payload, touch). `AngularSample` is the single
//! normalized shape the tracking pipeline consumes.

use serde::{Deserialize, Serialize};

/// Monotonic timestamp in nanoseconds since session start.
pub type TimestampNs = u64;

/// One normalized angular-rate reading (rad/s).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngularSample {
    pub roll_rate: f64,
    pub pitch_rate: f64,
    pub yaw_rate: f64,
    #[serde(rename = "t")]
    pub timestamp_ns: TimestampNs,
}

impl AngularSample {
    pub fn new(roll_rate: f64, pitch_rate: f64, yaw_rate: f64, timestamp_ns: TimestampNs) -> Self {
        Self {
            roll_rate,
            pitch_rate,
            yaw_rate,
            timestamp_ns,
        }
    }

    /// A zero-rate sample (device at rest).
    pub fn at_rest(timestamp_ns: TimestampNs) -> Self {
        Self::new(0.0, 0.0, 0.0, timestamp_ns)
    }

    /// Axis values in `[roll, pitch, yaw]` order.
    pub fn axes(&self) -> [f64; 3] {
        [self.roll_rate, self.pitch_rate, self.yaw_rate]
    }

    /// Whether every axis is a finite number.
    pub fn is_finite(&self) -> bool {
        self.axes().iter().all(|v| v.is_finite())
    }
}

/// Decoded payload from the external Bluetooth controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ControllerPayload {
    pub gx: f64,
    pub gy: f64,
    pub gz: f64,
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
    #[serde(default)]
    pub up: bool,
    #[serde(default)]
    pub down: bool,
}

impl ControllerPayload {
    /// Whether any of the four direction buttons is held.
    pub fn any_button(&self) -> bool {
        self.left || self.right || self.up || self.down
    }
}

/// Touch pointer phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchPhase {
    Down,
    Move,
    Up,
}

/// Raw input from one of the collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawInput {
    /// Onboard 3-axis gyroscope.
    Gyro { x: f64, y: f64, z: f64 },

    /// Onboard accelerometer (m/s^2). Calibration reference only.
    Accelerometer { x: f64, y: f64, z: f64 },

    /// Onboard magnetometer (uT). Calibration reference only.
    Magnetometer { x: f64, y: f64, z: f64 },

    /// External controller payload.
    Controller(ControllerPayload),

    /// Touch on the viewer surface, normalized to the eye viewport.
    Touch { phase: TouchPhase, x: f64, y: f64 },
}

/// A raw input with the time it arrived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedInput {
    #[serde(rename = "t")]
    pub timestamp_ns: TimestampNs,

    #[serde(flatten)]
    pub input: RawInput,
}

impl TimedInput {
    pub fn new(timestamp_ns: TimestampNs, input: RawInput) -> Self {
        Self {
            timestamp_ns,
            input,
        }
    }

    pub fn gyro(timestamp_ns: TimestampNs, x: f64, y: f64, z: f64) -> Self {
        Self::new(timestamp_ns, RawInput::Gyro { x, y, z })
    }

    pub fn controller(timestamp_ns: TimestampNs, payload: ControllerPayload) -> Self {
        Self::new(timestamp_ns, RawInput::Controller(payload))
    }

    pub fn touch(timestamp_ns: TimestampNs, phase: TouchPhase, x: f64, y: f64) -> Self {
        Self::new(timestamp_ns, RawInput::Touch { phase, x, y })
    }

    /// Whether this input carries an angular rate (as opposed to a
    /// reference-only reading or a discrete touch).
    pub fn is_continuous(&self) -> bool {
        matches!(
            self.input,
            RawInput::Gyro { .. } | RawInput::Controller(_)
        )
    }
}

/// Header line of a recorded input stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingHeader {
    /// Schema version for forward compatibility.
    pub schema_version: String,

    /// Wall-clock time at session start (RFC 3339).
    pub epoch_wall: String,

    /// Nominal sensor rate (Hz).
    pub sample_rate_hz: u32,
}

/// Parse inputs from JSONL content, skipping blank and `#` header lines.
pub fn parse_inputs(jsonl: &str) -> Result<Vec<TimedInput>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Serialize inputs to JSONL format.
pub fn serialize_inputs(inputs: &[TimedInput]) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    for input in inputs {
        output.push_str(&serde_json::to_string(input)?);
        output.push('\n');
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gyro_json_shape() {
        let input = TimedInput::gyro(1_000, 0.5, -0.25, 0.0);
        let json = serde_json::to_string(&input).unwrap();
        assert!(json.contains("\"t\":1000"));
        assert!(json.contains("\"type\":\"gyro\""));
        assert!(json.contains("\"x\":0.5"));
    }

    #[test]
    fn test_controller_payload_inside_stream() {
        let payload = ControllerPayload {
            gx: 0.1,
            gy: 0.2,
            gz: 0.0,
            left: true,
            ..Default::default()
        };
        let inputs = vec![
            TimedInput::controller(0, payload),
            TimedInput::touch(5, TouchPhase::Down, 0.3, 0.4),
        ];
        let jsonl = serialize_inputs(&inputs).unwrap();
        assert_eq!(parse_inputs(&jsonl).unwrap(), inputs);
    }

    #[test]
    fn test_parse_skips_header_comment() {
        let jsonl = "# {\"schema_version\":\"1.0\"}\n\n{\"t\":7,\"type\":\"gyro\",\"x\":0.0,\"y\":0.0,\"z\":0.0}\n";
        let parsed = parse_inputs(jsonl).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].timestamp_ns, 7);
    }

    #[test]
    fn test_sample_finiteness() {
        assert!(AngularSample::at_rest(0).is_finite());
        assert!(!AngularSample::new(f64::NAN, 0.0, 0.0, 0).is_finite());
        assert!(!AngularSample::new(0.0, f64::INFINITY, 0.0, 0).is_finite());
    }

    #[test]
    fn test_continuous_inputs() {
        assert!(TimedInput::gyro(0, 0.0, 0.0, 0.0).is_continuous());
        assert!(TimedInput::controller(0, ControllerPayload::default()).is_continuous());
        assert!(!TimedInput::touch(0, TouchPhase::Down, 0.5, 0.5).is_continuous());
        assert!(!TimedInput::new(0, RawInput::Accelerometer { x: 0.0, y: 0.0, z: 9.8 })
            .is_continuous());
    }
}
