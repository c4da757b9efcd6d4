//! Error types for the lightfinder core crate.
//!
//! The registry itself never fails; errors here come from parsing device
//! identifiers and addresses, and from loading or validating configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using CoreError as the error type.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Top-level error type for core operations.
#[derive(Debug, Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum CoreError {
    /// Identifier or address parsing errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while building identifiers and addresses from text.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ParseError {
    /// Identifier was empty
    #[error("Device identifier cannot be empty")]
    EmptyIdentifier,

    /// Address was empty after trimming
    #[error("Device address cannot be empty")]
    EmptyAddress,
}

/// Errors related to configuration.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {reason}")]
    LoadFailed { path: String, reason: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {reason}")]
    InvalidFormat { reason: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigError {
    /// Creates a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
