// Error types for configuration loading

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration key not found: {0}")]
    KeyNotFound(String),

    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deserialization error for '{key}': {message}")]
    DeserializationError { key: String, message: String },
}

impl ConfigError {
    /// Whether this error means a key was absent rather than malformed.
    pub fn is_missing(&self) -> bool {
        matches!(self, ConfigError::KeyNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
