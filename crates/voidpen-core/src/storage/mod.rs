mod config;

pub use config::{Config, DefaultsConfig, FadeConfig, NoticesConfig};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/voidpen[-dev]/` based on VOIDPEN_ENV.
///
/// Set VOIDPEN_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("VOIDPEN_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("voidpen-dev")
    } else {
        base_dir.join("voidpen")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(e.to_string()))?;
    Ok(dir)
}
