//! Headaim Session
//!
//! Async runtime around the aim pipeline. One task owns the pipeline and
//! is the only writer of aim state; everything else talks to it through
//! channels.
//!
//! # Architecture
//!
//! ```text
//!   push_sample ──watch (latest wins)─┐
//!   touch / commands ──mpsc───────────┤
//!   countdown task (1 s) ──mpsc───────┤
//!                                     ▼
//!                           ┌───────────────────┐
//!                           │   session loop    │
//!                           │   AimPipeline     │
//!                           └────┬─────────┬────┘
//!                 watch<AimSnapshot>       mpsc<AimEvent>
//!                   (render loop)          (content layer)
//! ```

pub mod countdown;
pub mod session;

pub use session::*;
