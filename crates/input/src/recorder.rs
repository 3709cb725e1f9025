//! Append-only recorder for raw input streams.
//!
//! Recordings are JSONL: a `# {header}` comment line followed by one
//! `TimedInput` per line. They feed `ReplaySource` and the CLI `replay`
//! command.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use headaim_common::error::{HeadaimError, HeadaimResult};
use headaim_model::sample::{RecordingHeader, TimedInput};

/// Writes inputs as JSONL to any byte sink.
///
/// Buffered output is flushed once per second of recorded samples (per the
/// header's sample rate) and on drop.
pub struct SampleWriter<W: Write = BufWriter<File>> {
    sink: W,
    path: Option<PathBuf>,
    flush_every: u64,
    inputs_written: u64,
}

impl SampleWriter {
    /// Create (or truncate) a recording file.
    pub fn create(path: impl Into<PathBuf>, header: RecordingHeader) -> HeadaimResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(&path)?;
        let mut writer = Self::from_writer(BufWriter::new(file), header)?;
        writer.path = Some(path);
        Ok(writer)
    }
}

impl<W: Write> SampleWriter<W> {
    /// Start a recording on an existing sink; the header line goes out
    /// immediately.
    pub fn from_writer(mut sink: W, header: RecordingHeader) -> HeadaimResult<Self> {
        let header_json = serde_json::to_string(&header)?;
        writeln!(sink, "# {header_json}")
            .map_err(|e| HeadaimError::input(format!("failed to write recording header: {e}")))?;

        Ok(Self {
            sink,
            path: None,
            flush_every: u64::from(header.sample_rate_hz.max(1)),
            inputs_written: 0,
        })
    }

    pub fn write_input(&mut self, input: &TimedInput) -> HeadaimResult<()> {
        let json = serde_json::to_string(input)?;
        writeln!(self.sink, "{json}").map_err(|e| {
            HeadaimError::input(format!("failed to write input at t={}: {e}", input.timestamp_ns))
        })?;
        self.inputs_written += 1;

        if self.inputs_written % self.flush_every == 0 {
            self.flush()?;
        }
        Ok(())
    }

    pub fn write_all(&mut self, inputs: &[TimedInput]) -> HeadaimResult<()> {
        inputs.iter().try_for_each(|input| self.write_input(input))
    }

    pub fn flush(&mut self) -> HeadaimResult<()> {
        self.sink
            .flush()
            .map_err(|e| HeadaimError::input(format!("failed to flush recording: {e}")))
    }

    pub fn inputs_written(&self) -> u64 {
        self.inputs_written
    }

    /// File being written, when the writer was opened with [`SampleWriter::create`].
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl<W: Write> Drop for SampleWriter<W> {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!(error = %e, "Recording not fully flushed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use headaim_model::sample::{parse_inputs, ControllerPayload, TouchPhase};

    fn header() -> RecordingHeader {
        RecordingHeader {
            schema_version: "1.0".to_string(),
            epoch_wall: "2026-01-01T00:00:00Z".to_string(),
            sample_rate_hz: 50,
        }
    }

    fn inputs() -> Vec<TimedInput> {
        vec![
            TimedInput::gyro(0, 0.0, 0.0, 0.0),
            TimedInput::controller(20_000_000, ControllerPayload::default()),
            TimedInput::touch(40_000_000, TouchPhase::Down, 0.4, 0.6),
        ]
    }

    #[test]
    fn test_recording_parses_back() {
        let mut buf = Vec::new();
        {
            let mut writer = SampleWriter::from_writer(&mut buf, header()).unwrap();
            writer.write_all(&inputs()).unwrap();
            assert_eq!(writer.inputs_written(), 3);
            assert!(writer.path().is_none());
        }

        let content = String::from_utf8(buf).unwrap();
        assert_eq!(content.lines().count(), 4);
        assert!(content.starts_with("# {"));
        assert_eq!(parse_inputs(&content).unwrap(), inputs());
    }

    #[test]
    fn test_create_writes_file() {
        let dir = std::env::temp_dir().join("headaim_test_writer");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("nested").join("samples.jsonl");

        {
            let mut writer = SampleWriter::create(&path, header()).unwrap();
            writer.write_all(&inputs()).unwrap();
            assert_eq!(writer.path(), Some(path.as_path()));
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(parse_inputs(&content).unwrap().len(), 3);

        std::fs::remove_dir_all(&dir).ok();
    }
}
