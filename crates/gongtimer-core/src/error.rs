//! Core error types for gongtimer-core.
//!
//! This module defines the error hierarchy using thiserror. Cue failures
//! are not part of [`CoreError`]: the scheduler logs them and carries on.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for gongtimer-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

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

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Duration text is not `MM:SS` or `HH:MM:SS`
    #[error("Invalid duration '{text}': expected MM:SS or HH:MM:SS")]
    InvalidDuration { text: String },

    /// No bell with that id
    #[error("No bell with id {id}")]
    UnknownBell { id: u32 },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
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

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Errors raised by a cue emitter.
#[derive(Error, Debug)]
pub enum CueError {
    /// No output device (or the emitter was never loaded)
    #[error("Audio output unavailable: {0}")]
    Unavailable(String),

    /// The sound asset could not be read or decoded
    #[error("Failed to load sound {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Playback could not be started
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
