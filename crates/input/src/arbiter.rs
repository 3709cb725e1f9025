//! Session input-mode selection.
//!
//! Runs once when a session is built. There is no runtime switching: the
//! chosen mode holds until the session ends.

use headaim_common::config::AppConfig;
use headaim_common::error::{HeadaimError, HeadaimResult};
use headaim_model::session::SessionMode;

/// What the platform reports at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceAvailability {
    /// Onboard gyroscope present.
    pub sensors_present: bool,
    /// A usable calibration exists, or one will run at session start.
    pub sensors_calibrated: bool,
    /// An external controller is paired.
    pub controller_paired: bool,
    /// The user asked for the external controller.
    pub controller_requested: bool,
    /// A touch surface is available.
    pub touch_available: bool,
}

impl SourceAvailability {
    /// Availability as seen by a device with every source present.
    pub fn all() -> Self {
        Self {
            sensors_present: true,
            sensors_calibrated: true,
            controller_paired: true,
            controller_requested: true,
            touch_available: true,
        }
    }

    /// Fill in the user-controlled fields from configuration.
    ///
    /// A session counts as calibrated when a complete calibration is saved,
    /// or when auto-calibration will run before tracking starts.
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        self.controller_requested = config.input.controller_enabled;
        self.sensors_calibrated = config.calibration.complete_points().is_some()
            || config.input.auto_calibrate;
        self
    }
}

/// Picks the session mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct InputArbiter;

impl InputArbiter {
    /// Prefer the controller when paired and requested, then calibrated
    /// sensors, then touch. Fails only when no source at all is usable.
    pub fn select(availability: &SourceAvailability) -> HeadaimResult<SessionMode> {
        let mode = if availability.controller_paired && availability.controller_requested {
            SessionMode::ControllerDriven
        } else if availability.sensors_present && availability.sensors_calibrated {
            SessionMode::SensorDriven
        } else if availability.touch_available {
            SessionMode::TouchDriven
        } else {
            return Err(HeadaimError::no_input_source(format!(
                "sensors_present={} sensors_calibrated={} controller_paired={} controller_requested={} touch_available=false",
                availability.sensors_present,
                availability.sensors_calibrated,
                availability.controller_paired,
                availability.controller_requested,
            )));
        };

        tracing::info!(%mode, ?availability, "Selected input mode");
        Ok(mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_wins_when_paired_and_requested() {
        assert_eq!(
            InputArbiter::select(&SourceAvailability::all()).unwrap(),
            SessionMode::ControllerDriven
        );
    }

    #[test]
    fn test_paired_but_not_requested_uses_sensors() {
        let availability = SourceAvailability {
            controller_requested: false,
            ..SourceAvailability::all()
        };
        assert_eq!(
            InputArbiter::select(&availability).unwrap(),
            SessionMode::SensorDriven
        );
    }

    #[test]
    fn test_uncalibrated_sensors_fall_back_to_touch() {
        let availability = SourceAvailability {
            sensors_present: true,
            sensors_calibrated: false,
            touch_available: true,
            ..Default::default()
        };
        assert_eq!(
            InputArbiter::select(&availability).unwrap(),
            SessionMode::TouchDriven
        );
    }

    #[test]
    fn test_no_sensors_no_controller_still_works_with_touch() {
        let availability = SourceAvailability {
            touch_available: true,
            ..Default::default()
        };
        assert_eq!(
            InputArbiter::select(&availability).unwrap(),
            SessionMode::TouchDriven
        );
    }

    #[test]
    fn test_nothing_available_is_an_error() {
        let err = InputArbiter::select(&SourceAvailability::default()).unwrap_err();
        assert!(matches!(err, HeadaimError::NoInputSource { .. }));
    }

    #[test]
    fn test_with_config_reads_preferences() {
        let mut config = AppConfig::default();
        config.input.controller_enabled = true;
        config.input.auto_calibrate = false;

        let availability = SourceAvailability {
            sensors_present: true,
            touch_available: true,
            ..Default::default()
        }
        .with_config(&config);

        assert!(availability.controller_requested);
        assert!(!availability.sensors_calibrated);
        assert_eq!(
            InputArbiter::select(&availability).unwrap(),
            SessionMode::TouchDriven
        );
    }
}
