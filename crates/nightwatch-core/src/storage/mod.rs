mod config;
mod scene;

pub use config::{AudioConfig, ClockConfig, Config, DoorsConfig, GameConfig, UiConfig};
pub use scene::{EntitySpec, SceneLayout};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/nightwatch[-dev]/` based on NIGHTWATCH_ENV.
///
/// Set NIGHTWATCH_ENV=dev to use the development data directory.
/// NIGHTWATCH_HOME overrides the location entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("NIGHTWATCH_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("NIGHTWATCH_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("nightwatch-dev")
            } else {
                base_dir.join("nightwatch")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
