//! Configuration-related errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading or persisting configuration.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum ConfigError {
    /// The settings store could not be read
    #[error("Failed to load configuration: {message}")]
    LoadFailed { message: String },

    /// The settings store could not be written
    #[error("Failed to save configuration: {message}")]
    SaveFailed { message: String },

    /// A stored document did not parse
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    /// A provider record references an identifier missing from the registry
    #[error("Unknown provider id in configuration: {provider_id}")]
    UnknownProvider { provider_id: String },
}
