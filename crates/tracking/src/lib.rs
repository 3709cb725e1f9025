//! Headaim Tracking — the aim pipeline.
//!
//! Turns angular samples into a stable aim point and dwell clicks:
//! - **Integrator:** angular rate to normalized aim target (deadzone,
//!   drift decay, per-tick rate limit, edge band clamp)
//! - **Smoother:** adaptive exponential smoothing of the displayed aim
//! - **Dwell:** hold-to-click state machine
//! - **Calibration:** guided five-pose capture with center-only fallback
//! - **Reference:** gravity/geomagnetic reference orientation
//! - **Pipeline:** one synchronous pass per input, composing the above
//!
//! This crate is pure computation: no I/O, no timers, no threads.
//! Time only enters through sample timestamps and explicit `tick()` calls.

pub mod calibration;
pub mod dwell;
pub mod integrator;
pub mod pipeline;
pub mod reference;
pub mod smoother;

pub use calibration::{CalibrationEngine, CalibrationState};
pub use dwell::{DwellActivation, DwellState};
pub use integrator::MotionIntegrator;
pub use pipeline::AimPipeline;
pub use smoother::AimSmoother;
