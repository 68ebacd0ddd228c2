//! Core error types for voidpen-core.
//!
//! Session commands never panic and never leave the session half-mutated:
//! a rejected command returns a [`SessionError`] and the state is untouched.

use std::path::PathBuf;
use thiserror::Error;

use crate::session::{Stage, TrackingMode};

/// Core error type for voidpen-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Session command rejected
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A command the session refused to apply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// `begin` with a commitment that is empty after trimming
    #[error("Commitment is empty")]
    EmptyCommitment,

    /// Command not accepted in the current stage
    #[error("Cannot {action} while in {stage:?} stage")]
    WrongStage { action: &'static str, stage: Stage },

    /// Target outside the allowed range for its mode
    #[error("Target {value} out of range for {mode:?} mode ({min}..={max})")]
    TargetOutOfRange {
        mode: TrackingMode,
        value: u32,
        min: u32,
        max: u32,
    },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Home directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
