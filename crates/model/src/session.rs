//! Session-level enums.

use serde::{Deserialize, Serialize};

/// Which input source drives the aim point for a session.
///
/// Selected once at session start and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Onboard gyroscope drives the aim; dwell produces clicks.
    SensorDriven,
    /// External Bluetooth controller drives the aim; buttons click.
    ControllerDriven,
    /// Direct touch; pointer-down clicks immediately.
    TouchDriven,
}

impl SessionMode {
    /// Whether dwell-to-click is active in this mode.
    pub fn uses_dwell(&self) -> bool {
        matches!(self, SessionMode::SensorDriven)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::SensorDriven => "sensor",
            SessionMode::ControllerDriven => "controller",
            SessionMode::TouchDriven => "touch",
        }
    }
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognised session mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown session mode '{0}' (expected sensor, controller or touch)")]
pub struct UnknownSessionMode(pub String);

impl std::str::FromStr for SessionMode {
    type Err = UnknownSessionMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sensor" | "sensor_driven" => Ok(SessionMode::SensorDriven),
            "controller" | "controller_driven" => Ok(SessionMode::ControllerDriven),
            "touch" | "touch_driven" => Ok(SessionMode::TouchDriven),
            other => Err(UnknownSessionMode(other.to_string())),
        }
    }
}
