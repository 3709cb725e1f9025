//! Built-in synthetic scenarios.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;
use headaim_common::clock::SessionClock;
use headaim_common::config::{AppConfig, CalibrationRecord};
use headaim_input::arbiter::SourceAvailability;
use headaim_input::recorder::SampleWriter;
use headaim_model::calibration::CalibrationPose;
use headaim_model::sample::{RecordingHeader, TimedInput};
use headaim_model::session::SessionMode;
use headaim_session::AimSession;
use headaim_tracking::AimPipeline;

use super::replay::print_record;
use crate::driver::{self, Record};

/// Seconds each calibration pose is held in the `calibrate` scenario:
/// five countdown ticks plus the capture tick.
const POSE_HOLD_SECS: f64 = 6.0;

/// Resting gyro bias used by the `calibrate` scenario.
const REST_BIAS: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Calibrated at rest, head held still: one dwell click
    Hold,
    /// Calibrated at rest, constant leftward roll until the band edge
    TurnLeft,
    /// Uncalibrated start: guided calibration through all five poses
    Calibrate,
}

impl Scenario {
    fn default_secs(&self) -> f64 {
        match self {
            Scenario::Hold => 4.0,
            Scenario::TurnLeft => 3.0,
            Scenario::Calibrate => POSE_HOLD_SECS * 5.0 + 2.0,
        }
    }

    fn config(&self) -> AppConfig {
        let mut config = AppConfig::default();
        if *self != Scenario::Calibrate {
            config.calibration = CalibrationRecord::complete([[0.0; 3]; 5]);
        }
        config
    }

    /// Gyro rates `(roll, pitch)` at `secs` into the scenario.
    fn rates_at(&self, secs: f64) -> (f64, f64) {
        match self {
            Scenario::Hold => (0.0, 0.0),
            Scenario::TurnLeft => {
                if secs < 0.5 {
                    (0.0, 0.0)
                } else {
                    (0.05, 0.0)
                }
            }
            Scenario::Calibrate => {
                let pose = CalibrationPose::from_index((secs / POSE_HOLD_SECS) as usize)
                    .unwrap_or(CalibrationPose::Center);
                match pose {
                    CalibrationPose::Center => (REST_BIAS, 0.0),
                    CalibrationPose::Up => (REST_BIAS, -0.4),
                    CalibrationPose::Down => (REST_BIAS, 0.4),
                    CalibrationPose::Left => (REST_BIAS + 0.4, 0.0),
                    CalibrationPose::Right => (REST_BIAS - 0.4, 0.0),
                }
            }
        }
    }

    pub fn inputs(&self, secs: f64, rate_hz: u32) -> Vec<TimedInput> {
        let interval_ns = 1_000_000_000 / rate_hz.max(1) as u64;
        let count = (SessionClock::secs_to_ns(secs) / interval_ns) + 1;
        (0..count)
            .map(|i| {
                let t = i * interval_ns;
                let (roll, pitch) = self.rates_at(SessionClock::ns_to_secs(t));
                TimedInput::gyro(t, roll, pitch, 0.0)
            })
            .collect()
    }
}

pub async fn run(
    scenario: Scenario,
    secs: Option<f64>,
    rate_hz: u32,
    record: Option<PathBuf>,
    live: bool,
) -> anyhow::Result<()> {
    let secs = secs.unwrap_or_else(|| scenario.default_secs());
    let inputs = scenario.inputs(secs, rate_hz);
    tracing::info!(?scenario, secs, rate_hz, inputs = inputs.len(), "Simulating");

    if let Some(path) = record {
        let header = RecordingHeader {
            schema_version: "1.0".to_string(),
            epoch_wall: SessionClock::start().epoch_wall().to_string(),
            sample_rate_hz: rate_hz,
        };
        let mut writer = SampleWriter::create(&path, header)?;
        writer.write_all(&inputs)?;
        writer.flush()?;
        tracing::info!(?path, inputs = writer.inputs_written(), "Recording written");
    }

    if live {
        return run_live(scenario.config(), inputs, rate_hz).await;
    }

    let mut pipeline = AimPipeline::new(SessionMode::SensorDriven, &scenario.config())?;
    let stats = driver::drive(&mut pipeline, &inputs, None, print_record)?;
    tracing::info!(
        events = stats.events,
        clicks = stats.clicks,
        x = stats.last.target.x,
        y = stats.last.target.y,
        calibrated = stats.last.calibrated,
        "Simulation finished"
    );
    Ok(())
}

/// Feed the inputs through a real session at `rate_hz`, restamped against
/// the session clock.
async fn run_live(config: AppConfig, inputs: Vec<TimedInput>, rate_hz: u32) -> anyhow::Result<()> {
    let availability = SourceAvailability {
        sensors_present: true,
        ..Default::default()
    }
    .with_config(&config);

    let mut session = AimSession::start(config, &availability)?;
    let mut events = session
        .take_events()
        .ok_or_else(|| anyhow::anyhow!("event stream already taken"))?;

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            print_record(Record::Event(&event));
        }
    });

    let clock = SessionClock::start();
    let mut ticker = tokio::time::interval(Duration::from_nanos(
        1_000_000_000 / rate_hz.max(1) as u64,
    ));
    for input in inputs {
        ticker.tick().await;
        session.push_sample(TimedInput::new(clock.elapsed_ns(), input.input))?;
    }

    let summary = session.shutdown().await?;
    printer.await?;
    tracing::info!(
        inputs = summary.inputs_processed,
        clicks = summary.clicks,
        calibrated = summary.calibrated,
        "Live simulation finished"
    );
    Ok(())
}
