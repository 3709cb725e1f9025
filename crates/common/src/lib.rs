//! Headaim Common Utilities
//!
//! Shared infrastructure for all Headaim crates:
//! - Error types and result aliases
//! - Session clock and rate control for sample/render cadences
//! - Tracing/logging initialization
//! - Configuration loading and persistence (tunables + calibration)

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
