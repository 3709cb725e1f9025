//! Events emitted by the aim core to the rendering/content layer.
//!
//! Delivery is fire-and-forget: the core never waits on a consumer.

use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationPose;
use crate::sample::TimestampNs;

/// What produced a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickSource {
    /// Sustained stable aim (sensor-driven mode).
    Dwell,
    /// External controller button.
    Controller,
    /// Direct touch.
    Touch,
}

/// Event payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AimEventKind {
    /// Activate the content under a normalized point.
    ClickAt { x: f64, y: f64, source: ClickSource },

    /// A calibration pose is being requested.
    PoseRequested { pose: CalibrationPose },

    /// Countdown step for the current pose. `haptic` marks the final
    /// capture phase.
    CountdownTick {
        pose: CalibrationPose,
        remaining: u32,
        haptic: bool,
    },

    /// The current sample was stored for a pose.
    PoseCaptured { pose: CalibrationPose },

    /// Calibration finished. `degenerate` means only the center pose
    /// could be used.
    CalibrationCompleted { degenerate: bool },

    /// Calibration was abandoned; any prior calibration stays active.
    CalibrationAborted,

    /// Aim recentred and offset re-captured.
    Recentered,
}

/// A timestamped event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AimEvent {
    #[serde(rename = "t")]
    pub timestamp_ns: TimestampNs,

    #[serde(flatten)]
    pub kind: AimEventKind,
}

impl AimEvent {
    pub fn new(timestamp_ns: TimestampNs, kind: AimEventKind) -> Self {
        Self { timestamp_ns, kind }
    }

    pub fn click(timestamp_ns: TimestampNs, x: f64, y: f64, source: ClickSource) -> Self {
        Self::new(timestamp_ns, AimEventKind::ClickAt { x, y, source })
    }

    /// Click position if this is a click.
    pub fn click_position(&self) -> Option<(f64, f64)> {
        match &self.kind {
            AimEventKind::ClickAt { x, y, .. } => Some((*x, *y)),
            _ => None,
        }
    }

    pub fn is_click(&self) -> bool {
        matches!(self.kind, AimEventKind::ClickAt { .. })
    }

    /// Timestamp as fractional seconds since session start.
    pub fn timestamp_secs(&self) -> f64 {
        self.timestamp_ns as f64 / 1_000_000_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_json_shape() {
        let event = AimEvent::click(42, 0.5, 0.25, ClickSource::Dwell);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"t\":42"));
        assert!(json.contains("\"type\":\"click_at\""));
        assert!(json.contains("\"source\":\"dwell\""));
    }

    #[test]
    fn test_click_position_extraction() {
        let click = AimEvent::click(0, 0.3, 0.7, ClickSource::Touch);
        assert_eq!(click.click_position(), Some((0.3, 0.7)));
        assert!(click.is_click());

        let tick = AimEvent::new(
            0,
            AimEventKind::CountdownTick {
                pose: CalibrationPose::Up,
                remaining: 3,
                haptic: true,
            },
        );
        assert_eq!(tick.click_position(), None);
        assert!(!tick.is_click());
    }

    #[test]
    fn test_lifecycle_event_parses() {
        let raw = r#"{"t":1500000000,"type":"pose_requested","pose":"left"}"#;
        let event: AimEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(
            event.kind,
            AimEventKind::PoseRequested {
                pose: CalibrationPose::Left
            }
        );
        assert!((event.timestamp_secs() - 1.5).abs() < 1e-9);
    }
}
