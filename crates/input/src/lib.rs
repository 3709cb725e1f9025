//! Headaim Input
//!
//! Everything between the collaborators that produce raw input and the
//! tracking pipeline:
//!
//! - **Sources:** pluggable `InputSource` backends (recorded replay)
//! - **Controller:** decoding of the Bluetooth controller's JSON payload
//! - **Sampler:** normalization of gyro/controller input into `AngularSample`
//! - **Arbiter:** one-shot selection of the session's input mode
//!
//! Recorded input streams use append-only JSONL, one `TimedInput` per line.

pub mod arbiter;
pub mod controller;
pub mod recorder;
pub mod sampler;
pub mod sources;

use headaim_common::error::HeadaimResult;
use headaim_model::sample::TimedInput;

pub use arbiter::{InputArbiter, SourceAvailability};
pub use sampler::OrientationSampler;

/// Trait for raw input backends.
pub trait InputSource: Send {
    /// Poll for the next input. Returns `None` if nothing is pending.
    fn poll(&mut self) -> HeadaimResult<Option<TimedInput>>;

    /// Source name for logging.
    fn name(&self) -> &str;
}
