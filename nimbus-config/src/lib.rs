// Configuration management for Nimbus
//
// Values come from the process environment, `.env` files, JSON/TOML files or
// explicit calls to `set`, and are looked up by their exact key.

pub mod config_service;
pub mod env;
pub mod error;
pub mod loader;
pub mod validation;

pub use config_service::{ConfigService, ConfigServiceBuilder};
pub use env::EnvLoader;
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use validation::ConfigValidator;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Main configuration store
#[derive(Clone)]
pub struct ConfigManager {
    config: Arc<RwLock<HashMap<String, serde_json::Value>>>,
    env_prefix: Option<String>,
}

impl ConfigManager {
    /// Create a new configuration manager
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(HashMap::new())),
            env_prefix: None,
        }
    }

    /// Create with environment variable prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            config: Arc::new(RwLock::new(HashMap::new())),
            env_prefix: Some(prefix.into()),
        }
    }

    /// Load configuration from environment variables
    pub fn load_env(&self) -> Result<()> {
        let loader = EnvLoader::new(self.env_prefix.clone());
        let mut config = self.config.write();
        for (key, value) in loader.load() {
            config.insert(key, serde_json::Value::String(value));
        }

        Ok(())
    }

    /// Load a `.env` file into the process environment, then load the environment.
    ///
    /// Without a path a missing `.env` in the working directory is not an error.
    pub fn load_dotenv(&self, path: Option<&Path>) -> Result<()> {
        match path {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
            }
            None => {
                if let Err(e) = dotenvy::dotenv() {
                    tracing::debug!(error = %e, "No .env file loaded");
                }
            }
        }
        self.load_env()
    }

    /// Load configuration from file
    pub fn load_file(&self, path: impl AsRef<Path>, format: FileFormat) -> Result<()> {
        let loader = ConfigLoader::new(format);
        let data = loader.load_file(path)?;

        match data {
            serde_json::Value::Object(map) => {
                let mut config = self.config.write();
                config.extend(map);
                Ok(())
            }
            _ => Err(ConfigError::ParseError(
                "configuration file must contain a table at the top level".to_string(),
            )),
        }
    }

    /// Set a configuration value
    pub fn set<T: serde::Serialize>(&self, key: &str, value: T) -> Result<()> {
        let json_value = serde_json::to_value(value)
            .map_err(|e| ConfigError::SerializationError(e.to_string()))?;

        self.config.write().insert(key.to_string(), json_value);

        Ok(())
    }

    /// Get a configuration value
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let config = self.config.read();

        let value = config
            .get(key)
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;

        serde_json::from_value(value.clone()).map_err(|e| ConfigError::DeserializationError {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    /// Get a configuration value with default
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Get a string value.
    ///
    /// Numbers and booleans are rendered to their textual form, so a value
    /// loaded from a TOML file as `42` still reads as `"42"`.
    pub fn get_string(&self, key: &str) -> Result<String> {
        let config = self.config.read();

        match config.get(key) {
            Some(serde_json::Value::String(s)) => Ok(s.clone()),
            Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
            Some(serde_json::Value::Bool(b)) => Ok(b.to_string()),
            Some(other) => Err(ConfigError::DeserializationError {
                key: key.to_string(),
                message: format!("expected a string, found {}", other),
            }),
            None => Err(ConfigError::KeyNotFound(key.to_string())),
        }
    }

    /// Get an integer value
    pub fn get_int(&self, key: &str) -> Result<i64> {
        match self.get::<i64>(key) {
            Ok(value) => Ok(value),
            Err(ConfigError::DeserializationError { .. }) => {
                let raw = self.get_string(key)?;
                raw.trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| ConfigError::DeserializationError {
                        key: key.to_string(),
                        message: e.to_string(),
                    })
            }
            Err(e) => Err(e),
        }
    }

    /// Get a boolean value
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        match self.get::<bool>(key) {
            Ok(value) => Ok(value),
            Err(ConfigError::DeserializationError { .. }) => {
                match self.get_string(key)?.trim().to_lowercase().as_str() {
                    "true" | "1" | "yes" => Ok(true),
                    "false" | "0" | "no" => Ok(false),
                    other => Err(ConfigError::DeserializationError {
                        key: key.to_string(),
                        message: format!("'{}' is not a boolean", other),
                    }),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Check if a key exists
    pub fn has(&self, key: &str) -> bool {
        self.config.read().contains_key(key)
    }

    /// Get all configuration keys
    pub fn keys(&self) -> Vec<String> {
        self.config.read().keys().cloned().collect()
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
