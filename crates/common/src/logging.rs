//! Tracing setup.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::config::LoggingConfig;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Install the global subscriber: console output (plain or JSON) plus an
/// optional append-only log file.
///
/// `RUST_LOG` takes precedence over `config.level`. Only the first call
/// installs anything.
pub fn init_logging(config: &LoggingConfig) {
    let mut layers: Vec<BoxedLayer> = Vec::with_capacity(2);

    layers.push(if config.json {
        fmt::layer()
            .json()
            .with_filter(filter(&config.level))
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_filter(filter(&config.level))
            .boxed()
    });

    if let Some(file) = config.file.as_deref().and_then(open_log_file) {
        layers.push(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_filter(filter(&config.level))
                .boxed(),
        );
    }

    tracing_subscriber::registry().with(layers).try_init().ok();
}

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

fn open_log_file(path: &Path) -> Option<File> {
    match std::fs::OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(file),
        Err(e) => {
            // No subscriber yet, so this cannot go through tracing.
            eprintln!("headaim: cannot open log file {}: {e}", path.display());
            None
        }
    }
}
