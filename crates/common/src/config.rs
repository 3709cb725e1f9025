//! Application configuration.
//!
//! Holds the user-tunable tracking parameters, input preferences, and the
//! persisted calibration. Stored as pretty JSON under the XDG config dir.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::{Path, PathBuf};

use crate::error::{HeadaimError, HeadaimResult};

/// Decimal places kept for persisted calibration values.
pub const CALIBRATION_PRECISION: i32 = 4;

/// Number of poses in a complete calibration.
pub const CALIBRATION_POSE_COUNT: usize = 5;

/// Global application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Aim tracking tunables.
    #[serde(default)]
    pub tracking: TrackingConfig,

    /// Input source preferences.
    #[serde(default)]
    pub input: InputConfig,

    /// Per-eye render geometry.
    #[serde(default)]
    pub display: DisplayConfig,

    /// Last complete calibration.
    #[serde(default)]
    pub calibration: CalibrationRecord,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Tunables for the aim pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Gyro-to-aim gain multiplier.
    pub sensitivity: f64,

    /// Smoothing constant in [0, 1); larger is smoother and slower.
    pub smoothing: f64,

    /// Seconds of stable aim required to fire a dwell click.
    pub hold_duration_secs: f64,

    /// Horizontal head-turn limit in degrees.
    pub yaw_limit_deg: f64,

    /// Vertical head-tilt limit in degrees.
    pub pitch_limit_deg: f64,
}

/// How an external controller's payload is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ControllerAxisMode {
    /// `gx`/`gy` drive the aim; any button press clicks at center.
    #[default]
    Angular,
    /// The four direction flags drive the aim at a fixed rate.
    Discrete,
}

/// Input source preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Use a paired Bluetooth controller when one is available.
    pub controller_enabled: bool,

    /// Payload interpretation for the external controller.
    pub controller_axis_mode: ControllerAxisMode,

    /// Run the guided calibration at session start when none is saved.
    pub auto_calibrate: bool,

    /// Emit haptic cues during the calibration countdown.
    pub haptic_feedback: bool,

    /// Countdown length per calibration pose, in ticks of one second.
    pub countdown_ticks: u32,

    /// Multiplier applied to raw gyro readings, for sensors that do not
    /// report rad/s.
    pub gyro_unit_scale: f64,

    /// Render-side snapshot rate (Hz).
    pub render_rate_hz: u32,
}

/// Pixel geometry of one eye's viewport and the crosshair marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub eye_width_px: f64,
    pub eye_height_px: f64,
    pub crosshair_width_px: f64,
    pub crosshair_height_px: f64,
}

/// A persisted calibration: five `[roll, pitch, yaw]` points in
/// Center, Up, Down, Left, Right order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CalibrationRecord {
    pub calibrated: bool,

    #[serde(
        serialize_with = "serialize_fixed_points",
        deserialize_with = "deserialize_fixed_points"
    )]
    pub points: Vec<[f64; 3]>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "headaim_tracking=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tracking: TrackingConfig::default(),
            input: InputConfig::default(),
            display: DisplayConfig::default(),
            calibration: CalibrationRecord::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            sensitivity: 2.2,
            smoothing: 0.65,
            hold_duration_secs: 3.0,
            yaw_limit_deg: 60.0,
            pitch_limit_deg: 45.0,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            controller_enabled: false,
            controller_axis_mode: ControllerAxisMode::Angular,
            auto_calibrate: true,
            haptic_feedback: true,
            countdown_ticks: 5,
            gyro_unit_scale: 1.0,
            render_rate_hz: 30,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            eye_width_px: 960.0,
            eye_height_px: 1080.0,
            crosshair_width_px: 40.0,
            crosshair_height_px: 40.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl TrackingConfig {
    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> HeadaimResult<()> {
        if !self.sensitivity.is_finite() || self.sensitivity <= 0.0 {
            return Err(HeadaimError::config(format!(
                "sensitivity must be positive, got {}",
                self.sensitivity
            )));
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(HeadaimError::config(format!(
                "smoothing must be in [0, 1), got {}",
                self.smoothing
            )));
        }
        if !self.hold_duration_secs.is_finite() || self.hold_duration_secs <= 0.0 {
            return Err(HeadaimError::config(format!(
                "hold duration must be positive, got {}",
                self.hold_duration_secs
            )));
        }
        Ok(())
    }
}

impl InputConfig {
    pub fn validate(&self) -> HeadaimResult<()> {
        if !self.gyro_unit_scale.is_finite() || self.gyro_unit_scale <= 0.0 {
            return Err(HeadaimError::config(format!(
                "gyro unit scale must be positive, got {}",
                self.gyro_unit_scale
            )));
        }
        Ok(())
    }
}

impl DisplayConfig {
    /// The eye must be non-empty and large enough to hold the crosshair.
    pub fn validate(&self) -> HeadaimResult<()> {
        let sizes = [
            self.eye_width_px,
            self.eye_height_px,
            self.crosshair_width_px,
            self.crosshair_height_px,
        ];
        if sizes.iter().any(|v| !v.is_finite() || *v < 0.0)
            || self.eye_width_px == 0.0
            || self.eye_height_px == 0.0
        {
            return Err(HeadaimError::config(format!(
                "display sizes must be positive, got {}x{} eye, {}x{} crosshair",
                self.eye_width_px,
                self.eye_height_px,
                self.crosshair_width_px,
                self.crosshair_height_px
            )));
        }
        if self.crosshair_width_px > self.eye_width_px
            || self.crosshair_height_px > self.eye_height_px
        {
            return Err(HeadaimError::config("crosshair is larger than the eye viewport"));
        }
        Ok(())
    }
}

impl CalibrationRecord {
    /// Build a record from a complete set of points.
    pub fn complete(points: [[f64; 3]; CALIBRATION_POSE_COUNT]) -> Self {
        Self {
            calibrated: true,
            points: points.iter().map(|p| round_point(*p)).collect(),
        }
    }

    /// The stored points, only if the record holds a complete calibration.
    pub fn complete_points(&self) -> Option<[[f64; 3]; CALIBRATION_POSE_COUNT]> {
        if !self.calibrated {
            return None;
        }
        self.points.clone().try_into().ok()
    }

    /// Forget the stored calibration.
    pub fn clear(&mut self) {
        self.calibrated = false;
        self.points.clear();
    }
}

impl AppConfig {
    /// Validate every section the pipeline reads.
    pub fn validate(&self) -> HeadaimResult<()> {
        self.tracking.validate()?;
        self.input.validate()?;
        self.display.validate()
    }

    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit path.
    pub fn load_from(path: &Path) -> HeadaimResult<Self> {
        if !path.exists() {
            return Err(HeadaimError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> HeadaimResult<()> {
        self.save_to(&config_file_path())
    }

    /// Save config to an explicit path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> HeadaimResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::debug!(?path, "Saved config");
        Ok(())
    }

    /// Path of the standard config file.
    pub fn path() -> PathBuf {
        config_file_path()
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("headaim").join("config.json")
}

fn round_fixed(value: f64) -> f64 {
    let scale = 10f64.powi(CALIBRATION_PRECISION);
    (value * scale).round() / scale
}

fn round_point(p: [f64; 3]) -> [f64; 3] {
    [round_fixed(p[0]), round_fixed(p[1]), round_fixed(p[2])]
}

fn serialize_fixed_points<S: Serializer>(points: &[[f64; 3]], s: S) -> Result<S::Ok, S::Error> {
    points
        .iter()
        .map(|p| round_point(*p))
        .collect::<Vec<_>>()
        .serialize(s)
}

fn deserialize_fixed_points<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<[f64; 3]>, D::Error> {
    let points = Vec::<[f64; 3]>::deserialize(d)?;
    Ok(points.into_iter().map(round_point).collect())
}
