//! Input source implementations.
//!
//! Live sensor and Bluetooth transports belong to the host platform and
//! push into a session directly. Only recorded streams are polled.

use std::collections::VecDeque;
use std::path::Path;

use headaim_common::error::{HeadaimError, HeadaimResult};
use headaim_model::sample::{parse_inputs, TimedInput};

use crate::InputSource;

/// Plays back a recorded input stream in order.
pub struct ReplaySource {
    inputs: VecDeque<TimedInput>,
    name: String,
}

impl ReplaySource {
    /// Create a source over pre-loaded inputs.
    pub fn new(inputs: Vec<TimedInput>) -> Self {
        Self {
            inputs: inputs.into(),
            name: "replay".to_string(),
        }
    }

    /// Load a JSONL recording written by `SampleWriter`.
    pub fn from_file(path: &Path) -> HeadaimResult<Self> {
        if !path.exists() {
            return Err(HeadaimError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let inputs = parse_inputs(&content)?;
        tracing::info!(?path, inputs = inputs.len(), "Loaded input recording");
        Ok(Self {
            inputs: inputs.into(),
            name: format!("replay:{}", path.display()),
        })
    }

}

impl InputSource for ReplaySource {
    fn poll(&mut self) -> HeadaimResult<Option<TimedInput>> {
        Ok(self.inputs.pop_front())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Drain every pending input from a source.
pub fn drain(source: &mut dyn InputSource) -> HeadaimResult<Vec<TimedInput>> {
    let mut out = Vec::new();
    while let Some(input) = source.poll()? {
        out.push(input);
    }
    tracing::debug!(source = source.name(), inputs = out.len(), "Drained input source");
    Ok(out)
}
