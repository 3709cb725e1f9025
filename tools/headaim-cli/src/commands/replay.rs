//! Replay a recorded input stream.

use std::path::PathBuf;

use headaim_common::config::AppConfig;
use headaim_input::sources::{drain, ReplaySource};
use headaim_model::session::SessionMode;
use headaim_tracking::AimPipeline;

use crate::driver::{self, Record};

pub fn run(config: &AppConfig, path: PathBuf, mode: SessionMode, snapshots: bool) -> anyhow::Result<()> {
    let mut source = ReplaySource::from_file(&path)
        .map_err(|e| anyhow::anyhow!("Failed to load recording: {e}"))?;
    let inputs = drain(&mut source)?;

    let mut pipeline = AimPipeline::new(mode, config)?;
    let rate = snapshots.then_some(config.input.render_rate_hz);

    let stats = driver::drive(&mut pipeline, &inputs, rate, print_record)?;

    tracing::info!(
        inputs = stats.inputs,
        events = stats.events,
        clicks = stats.clicks,
        x = stats.last.displayed.x,
        y = stats.last.displayed.y,
        "Replay finished"
    );
    Ok(())
}

/// Print one record as a JSON line. Serialization of these types cannot
/// fail, so errors are only logged.
pub fn print_record(record: Record<'_>) {
    match serde_json::to_string(&record) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::warn!(error = %e, "Failed to serialize output record"),
    }
}
