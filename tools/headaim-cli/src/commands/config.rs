//! Configuration inspection.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use headaim_common::config::AppConfig;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Overwrite the config file with defaults
    Reset,
    /// Print the config file location
    Path,
}

/// Load from an explicit path, or the standard location with defaults as
/// fallback.
pub fn load(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) if path.exists() => AppConfig::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display())),
        Some(_) => Ok(AppConfig::default()),
        None => Ok(AppConfig::load()),
    }
}

pub fn run(action: ConfigAction, path: Option<PathBuf>, config: &AppConfig) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(AppConfig::path);

    match action {
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        ConfigAction::Reset => {
            AppConfig::default().save_to(&path)?;
            println!("Reset {}", path.display());
        }
        ConfigAction::Path => {
            println!("{}", path.display());
        }
    }
    Ok(())
}
