//! Core error types for nightwatch-core.
//!
//! Gameplay never fails: denied interactions, empty pools and missing
//! collaborators are ordinary outcomes. These errors cover the surface
//! around the simulation (configuration, scene layouts, validation).

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for nightwatch-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Scene layout errors
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
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

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Data directory could not be resolved or created
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// Scene layout errors.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Failed to read scene from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    #[error("Failed to parse scene TOML: {0}")]
    ParseFailed(#[from] toml::de::Error),

    #[error("Failed to serialize scene TOML: {0}")]
    SerializeFailed(#[from] toml::ser::Error),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Interval range is inverted, negative or not finite
    #[error("Invalid range for '{field}': [{min}, {max})")]
    InvalidRange { field: String, min: f64, max: f64 },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// A layout refers to an entity or item that does not exist
    #[error("Unknown {kind} '{name}'")]
    UnknownReference { kind: String, name: String },

    /// Two entities share a name
    #[error("Duplicate entity name '{0}'")]
    DuplicateName(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

impl From<ValidationError> for ConfigError {
    fn from(err: ValidationError) -> Self {
        ConfigError::InvalidValue {
            key: match &err {
                ValidationError::InvalidRange { field, .. }
                | ValidationError::InvalidValue { field, .. } => field.clone(),
                _ => String::new(),
            },
            message: err.to_string(),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
