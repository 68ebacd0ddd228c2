//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Default tracking mode and targets for new sessions
//! - Fade engine delays
//! - Transient notice durations
//!
//! Configuration is stored at `~/.config/voidpen/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, CoreError};
use crate::fade::FadeTimings;
use crate::session::{SessionSettings, Targets, Timings, TrackingMode};

/// Defaults applied to every new session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub tracking_mode: TrackingMode,
    #[serde(default = "default_target_words")]
    pub target_words: u32,
    #[serde(default = "default_target_minutes")]
    pub target_minutes: u32,
}

/// Fade engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FadeConfig {
    #[serde(default = "default_pre_threshold_idle_ms")]
    pub pre_threshold_idle_ms: u64,
    #[serde(default = "default_post_threshold_idle_ms")]
    pub post_threshold_idle_ms: u64,
    #[serde(default = "default_idle_reset_counter")]
    pub idle_reset_counter: u32,
    #[serde(default = "default_glow_hold_ms")]
    pub glow_hold_ms: u64,
}

/// Auto-clear delays for transient notices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticesConfig {
    #[serde(default = "default_exit_warning_ms")]
    pub exit_warning_ms: u64,
    #[serde(default = "default_fullscreen_hint_ms")]
    pub fullscreen_hint_ms: u64,
    #[serde(default = "default_copied_ms")]
    pub copied_ms: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/voidpen/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub fade: FadeConfig,
    #[serde(default)]
    pub notices: NoticesConfig,
}

// Default functions
fn default_target_words() -> u32 {
    500
}
fn default_target_minutes() -> u32 {
    30
}
fn default_pre_threshold_idle_ms() -> u64 {
    20_000
}
fn default_post_threshold_idle_ms() -> u64 {
    5_000
}
fn default_idle_reset_counter() -> u32 {
    10
}
fn default_glow_hold_ms() -> u64 {
    1_200
}
fn default_exit_warning_ms() -> u64 {
    3_000
}
fn default_fullscreen_hint_ms() -> u64 {
    5_000
}
fn default_copied_ms() -> u64 {
    2_000
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            tracking_mode: TrackingMode::Words,
            target_words: default_target_words(),
            target_minutes: default_target_minutes(),
        }
    }
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            pre_threshold_idle_ms: default_pre_threshold_idle_ms(),
            post_threshold_idle_ms: default_post_threshold_idle_ms(),
            idle_reset_counter: default_idle_reset_counter(),
            glow_hold_ms: default_glow_hold_ms(),
        }
    }
}

impl Default for NoticesConfig {
    fn default() -> Self {
        Self {
            exit_warning_ms: default_exit_warning_ms(),
            fullscreen_hint_ms: default_fullscreen_hint_ms(),
            copied_ms: default_copied_ms(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("cannot set a whole section".to_string()));
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default config file location.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, CoreError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), CoreError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), CoreError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key in memory. Returns error if key is unknown
    /// or the value does not fit the key's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    pub fn timings(&self) -> Timings {
        Timings {
            fade: FadeTimings {
                pre_threshold_idle_ms: self.fade.pre_threshold_idle_ms,
                post_threshold_idle_ms: self.fade.post_threshold_idle_ms,
                idle_reset_counter: self.fade.idle_reset_counter,
                glow_hold_ms: self.fade.glow_hold_ms,
            },
            exit_warning_ms: self.notices.exit_warning_ms,
            fullscreen_hint_ms: self.notices.fullscreen_hint_ms,
            copied_ms: self.notices.copied_ms,
            ..Timings::default()
        }
    }

    /// Settings for a new session. Out-of-range targets are clamped.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            mode: self.defaults.tracking_mode,
            targets: Targets {
                words: self.defaults.target_words,
                minutes: self.defaults.target_minutes,
            }
            .clamped(),
            timings: self.timings(),
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "config unavailable, using defaults");
            Self::default()
        })
    }
}
