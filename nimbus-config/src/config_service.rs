// ConfigService - read-only configuration handed to the AWS facades

use crate::{ConfigError, ConfigManager, FileFormat, Result};
use serde::de::DeserializeOwned;
use std::path::PathBuf;

/// High-level configuration service
#[derive(Clone, Default)]
pub struct ConfigService {
    manager: ConfigManager,
}

impl ConfigService {
    /// Create an empty configuration service
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from an existing manager
    pub fn from_manager(manager: ConfigManager) -> Self {
        Self { manager }
    }

    /// Builder for creating configured service
    pub fn builder() -> ConfigServiceBuilder {
        ConfigServiceBuilder::new()
    }

    /// Shorthand for a service loaded from `.env` and the process environment.
    pub fn from_env() -> Result<Self> {
        Self::builder().load_dotenv(None).load_env().build()
    }

    /// Get configuration value
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.manager.get(key)
    }

    /// Get configuration value with default
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.manager.get_or(key, default)
    }

    /// Get string value
    pub fn get_string(&self, key: &str) -> Result<String> {
        self.manager.get_string(key)
    }

    /// Get an optional string value; blank values count as absent.
    pub fn get_optional(&self, key: &str) -> Result<Option<String>> {
        match self.manager.get_string(key) {
            Ok(value) if value.trim().is_empty() => Ok(None),
            Ok(value) => Ok(Some(value)),
            Err(ConfigError::KeyNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Get a required string value.
    ///
    /// Fails with [`ConfigError::KeyNotFound`] when the key is absent or blank.
    pub fn require(&self, key: &str) -> Result<String> {
        self.get_optional(key)?
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))
    }

    /// Get integer value
    pub fn get_int(&self, key: &str) -> Result<i64> {
        self.manager.get_int(key)
    }

    /// Get boolean value
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        self.manager.get_bool(key)
    }

    /// Check if key exists
    pub fn has(&self, key: &str) -> bool {
        self.manager.has(key)
    }

    /// All known keys
    pub fn keys(&self) -> Vec<String> {
        self.manager.keys()
    }

    /// Get underlying manager
    pub fn manager(&self) -> &ConfigManager {
        &self.manager
    }
}

/// Builder for ConfigService.
///
/// Sources are applied in a fixed order: `.env` file, environment, files,
/// then explicit values, so later sources win.
pub struct ConfigServiceBuilder {
    manager: ConfigManager,
    load_env: bool,
    load_dotenv: bool,
    dotenv_path: Option<PathBuf>,
    config_files: Vec<(PathBuf, FileFormat)>,
    values: Vec<(String, serde_json::Value)>,
}

impl ConfigServiceBuilder {
    pub fn new() -> Self {
        Self {
            manager: ConfigManager::new(),
            load_env: false,
            load_dotenv: false,
            dotenv_path: None,
            config_files: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Set environment variable prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.manager = ConfigManager::with_prefix(prefix);
        self
    }

    /// Enable loading from environment variables
    pub fn load_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Enable loading from a .env file
    pub fn load_dotenv(mut self, path: Option<PathBuf>) -> Self {
        self.load_dotenv = true;
        self.dotenv_path = path;
        self
    }

    /// Add configuration file to load
    pub fn add_file(mut self, path: impl Into<PathBuf>, format: FileFormat) -> Self {
        self.config_files.push((path.into(), format));
        self
    }

    /// Set an explicit value
    pub fn set(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.values.push((key.into(), value.into()));
        self
    }

    /// Build the configuration service
    pub fn build(self) -> Result<ConfigService> {
        if self.load_dotenv {
            self.manager.load_dotenv(self.dotenv_path.as_deref())?;
        }

        if self.load_env {
            self.manager.load_env()?;
        }

        for (path, format) in &self.config_files {
            self.manager.load_file(path, *format)?;
        }

        for (key, value) in self.values {
            self.manager.set(&key, value)?;
        }

        Ok(ConfigService::from_manager(self.manager))
    }
}

impl Default for ConfigServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_present() {
        let config = ConfigService::builder()
            .set("AWS_REGION", "us-west-2")
            .build()
            .unwrap();

        assert_eq!(config.require("AWS_REGION").unwrap(), "us-west-2");
    }

    #[test]
    fn test_require_missing_and_blank() {
        let config = ConfigService::builder()
            .set("AWS_S3_BUCKET", "  ")
            .build()
            .unwrap();

        let err = config.require("AWS_REGION").unwrap_err();
        assert!(err.is_missing());
        assert!(err.to_string().contains("AWS_REGION"));

        assert!(config.require("AWS_S3_BUCKET").unwrap_err().is_missing());
        assert_eq!(config.get_optional("AWS_S3_BUCKET").unwrap(), None);
    }

    #[test]
    fn test_explicit_values_override_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aws.json");
        std::fs::write(&path, r#"{"AWS_REGION": "eu-west-1", "AWS_S3_BUCKET": "from-file"}"#)
            .unwrap();

        let config = ConfigService::builder()
            .add_file(&path, FileFormat::Json)
            .set("AWS_S3_BUCKET", "explicit")
            .build()
            .unwrap();

        assert_eq!(config.require("AWS_REGION").unwrap(), "eu-west-1");
        assert_eq!(config.require("AWS_S3_BUCKET").unwrap(), "explicit");
    }

    #[test]
    fn test_missing_dotenv_path_fails() {
        let result = ConfigService::builder()
            .load_dotenv(Some(PathBuf::from("/definitely/not/here/.env")))
            .build();

        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
