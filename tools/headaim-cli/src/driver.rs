//! Offline pipeline driver shared by `replay` and `simulate`.
//!
//! Feeds recorded inputs through an `AimPipeline` in timestamp order. When
//! the pipeline asks for calibration, the countdown is driven from the
//! input timestamps: one tick per elapsed second of input time.

use headaim_common::clock::RateController;
use headaim_common::error::HeadaimResult;
use headaim_model::aim::AimSnapshot;
use headaim_model::event::AimEvent;
use headaim_model::sample::{TimedInput, TimestampNs};
use headaim_tracking::AimPipeline;
use serde::Serialize;

const SECOND_NS: u64 = 1_000_000_000;

/// One line of driver output.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Record<'a> {
    Event(&'a AimEvent),
    Snapshot { snapshot: &'a AimSnapshot },
}

#[derive(Debug, Clone, Copy)]
pub struct DriveStats {
    pub inputs: u64,
    pub events: u64,
    pub clicks: u64,
    pub last: AimSnapshot,
}

/// Run `inputs` through `pipeline`, handing every event (and, when
/// `snapshot_rate_hz` is set, paced snapshots) to `sink`.
pub fn drive(
    pipeline: &mut AimPipeline,
    inputs: &[TimedInput],
    snapshot_rate_hz: Option<u32>,
    mut sink: impl FnMut(Record<'_>),
) -> HeadaimResult<DriveStats> {
    let mut rate = snapshot_rate_hz.map(RateController::new);
    let mut next_tick: Option<TimestampNs> = None;
    let mut stats = DriveStats {
        inputs: 0,
        events: 0,
        clicks: 0,
        last: pipeline.snapshot(),
    };

    for input in inputs {
        if stats.inputs == 0 && pipeline.needs_calibration() {
            let events = pipeline.begin_calibration(input.timestamp_ns)?;
            emit(events, &mut stats, &mut sink);
            next_tick = Some(input.timestamp_ns + SECOND_NS);
        }

        while let Some(tick_at) = next_tick.filter(|t| *t <= input.timestamp_ns) {
            let events = pipeline.tick_calibration(tick_at);
            emit(events, &mut stats, &mut sink);
            next_tick = pipeline
                .calibration_state()
                .is_in_progress()
                .then_some(tick_at + SECOND_NS);
        }

        let events = pipeline.process(input);
        emit(events, &mut stats, &mut sink);
        stats.inputs += 1;

        if let Some(rate) = rate.as_mut() {
            if rate.should_tick(input.timestamp_ns) {
                let snapshot = pipeline.snapshot();
                sink(Record::Snapshot {
                    snapshot: &snapshot,
                });
            }
        }
    }

    stats.last = pipeline.snapshot();
    Ok(stats)
}

fn emit(events: Vec<AimEvent>, stats: &mut DriveStats, sink: &mut impl FnMut(Record<'_>)) {
    for event in &events {
        stats.events += 1;
        if event.is_click() {
            stats.clicks += 1;
        }
        sink(Record::Event(event));
    }
}
