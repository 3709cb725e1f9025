//! Headaim Model
//!
//! Defines the data contracts shared by the aim pipeline:
//! - **Samples:** Raw collaborator input and normalized angular samples
//! - **Aim:** Normalized aim points and the published snapshot
//! - **Calibration:** Poses, five-slot calibration sets, and offsets
//! - **Events:** Clicks and calibration lifecycle notifications
//!
//! All aim coordinates are normalized to `[0.0, 1.0]` relative to one
//! eye's viewport, so they survive resolution changes.

pub mod aim;
pub mod calibration;
pub mod event;
pub mod sample;
pub mod session;

pub use aim::*;
pub use calibration::*;
pub use event::*;
pub use sample::*;
pub use session::*;
