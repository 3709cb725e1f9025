//! Input mode selection dry run.

use headaim_common::config::AppConfig;
use headaim_input::arbiter::{InputArbiter, SourceAvailability};

pub fn run(
    config: &AppConfig,
    sensors: bool,
    calibrated: bool,
    controller_paired: bool,
    controller_requested: bool,
    touch: bool,
    from_config: bool,
) -> anyhow::Result<()> {
    let mut availability = SourceAvailability {
        sensors_present: sensors,
        sensors_calibrated: calibrated,
        controller_paired,
        controller_requested,
        touch_available: touch,
    };
    if from_config {
        availability = availability.with_config(config);
    }

    match InputArbiter::select(&availability) {
        Ok(mode) => {
            println!("{mode}");
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!("{e}")),
    }
}
