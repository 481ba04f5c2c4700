//! AWS connection configuration.

use aws_credential_types::Credentials;
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_types::SdkConfig;
use aws_types::region::Region;
use nimbus_config::{ConfigError, ConfigService, ConfigValidator};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Configuration keys shared by every facade.
pub mod keys {
    pub const REGION: &str = "AWS_REGION";
    pub const ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
    pub const SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
    pub const SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
    pub const ENDPOINT_URL: &str = "AWS_ENDPOINT_URL";
}

/// Static credentials handed to every service client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

/// Region, credentials and endpoint used to build every service client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AwsConfig {
    /// AWS region.
    pub region: Option<String>,
    /// Explicit credentials; clients cannot be built without them.
    pub credentials: Option<StaticCredentials>,
    /// Custom endpoint URL (for LocalStack, MinIO, etc.).
    pub endpoint_url: Option<String>,
}

impl AwsConfig {
    /// Create a builder.
    pub fn builder() -> AwsConfigBuilder {
        AwsConfigBuilder::new()
    }

    /// Read region and explicit credentials from a configuration source.
    ///
    /// `AWS_REGION`, `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY` are
    /// required; `AWS_SESSION_TOKEN` and `AWS_ENDPOINT_URL` are optional.
    pub fn from_config(config: &ConfigService) -> Result<Self> {
        let region = config.require(keys::REGION)?;
        let access_key_id = config.require(keys::ACCESS_KEY_ID)?;
        let secret_access_key = config.require(keys::SECRET_ACCESS_KEY)?;

        let endpoint_url = config.get_optional(keys::ENDPOINT_URL)?;
        if let Some(endpoint) = &endpoint_url {
            ConfigValidator::is_url(endpoint, keys::ENDPOINT_URL)?;
        }

        Ok(Self {
            region: Some(region),
            credentials: Some(StaticCredentials {
                access_key_id,
                secret_access_key,
                session_token: config.get_optional(keys::SESSION_TOKEN)?,
            }),
            endpoint_url,
        })
    }

    /// Build the SDK configuration without touching the network or the
    /// environment. Needs a region and explicit credentials.
    pub fn sdk_config(&self) -> Result<SdkConfig> {
        let region = self
            .region
            .clone()
            .ok_or_else(|| ConfigError::KeyNotFound(keys::REGION.to_string()))?;

        let Some(creds) = &self.credentials else {
            return Err(ConfigError::ValidationError(
                "explicit credentials are required to build clients synchronously".to_string(),
            )
            .into());
        };

        let credentials = Credentials::new(
            &creds.access_key_id,
            &creds.secret_access_key,
            creds.session_token.clone(),
            None,
            "nimbus",
        );

        let mut builder = SdkConfig::builder()
            .behavior_version(aws_config::BehaviorVersion::latest())
            .region(Region::new(region))
            .credentials_provider(SharedCredentialsProvider::new(credentials));

        if let Some(endpoint) = &self.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        Ok(builder.build())
    }
}

/// Builder for AWS configuration.
#[derive(Default)]
pub struct AwsConfigBuilder {
    config: AwsConfig,
}

impl AwsConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the AWS region.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.config.region = Some(region.into());
        self
    }

    /// Use explicit credentials.
    pub fn explicit_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.config.credentials = Some(StaticCredentials {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        });
        self
    }

    /// Attach a session token to the explicit credentials.
    pub fn session_token(mut self, token: impl Into<String>) -> Self {
        if let Some(creds) = &mut self.config.credentials {
            creds.session_token = Some(token.into());
        }
        self
    }

    /// Set a custom endpoint URL (for LocalStack, MinIO, etc.).
    pub fn endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint_url = Some(url.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> AwsConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AwsError;

    fn base() -> nimbus_config::ConfigServiceBuilder {
        ConfigService::builder()
            .set(keys::REGION, "eu-west-1")
            .set(keys::ACCESS_KEY_ID, "AKIDEXAMPLE")
            .set(keys::SECRET_ACCESS_KEY, "secret")
    }

    #[test]
    fn test_from_config_reads_credentials() {
        let config = AwsConfig::from_config(&base().build().unwrap()).unwrap();

        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert!(config.endpoint_url.is_none());
        let creds = config.credentials.unwrap();
        assert_eq!(creds.access_key_id, "AKIDEXAMPLE");
        assert!(creds.session_token.is_none());
    }

    #[test]
    fn test_from_config_missing_secret() {
        let config = ConfigService::builder()
            .set(keys::REGION, "eu-west-1")
            .set(keys::ACCESS_KEY_ID, "AKIDEXAMPLE")
            .build()
            .unwrap();

        let err = AwsConfig::from_config(&config).unwrap_err();
        match err {
            AwsError::Config(ConfigError::KeyNotFound(key)) => {
                assert_eq!(key, keys::SECRET_ACCESS_KEY)
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_from_config_rejects_bad_endpoint() {
        let config = base()
            .set(keys::ENDPOINT_URL, "localhost:4566")
            .build()
            .unwrap();

        assert!(matches!(
            AwsConfig::from_config(&config),
            Err(AwsError::Config(ConfigError::ValidationError(_)))
        ));
    }

    #[test]
    fn test_sdk_config_carries_region_and_endpoint() {
        let config = AwsConfig::from_config(
            &base()
                .set(keys::ENDPOINT_URL, "http://localhost:4566")
                .build()
                .unwrap(),
        )
        .unwrap();

        let sdk = config.sdk_config().unwrap();
        assert_eq!(sdk.region().map(|r| r.as_ref()), Some("eu-west-1"));
        assert_eq!(sdk.endpoint_url(), Some("http://localhost:4566"));
        assert!(sdk.credentials_provider().is_some());
    }

    #[test]
    fn test_sdk_config_requires_explicit_credentials() {
        let config = AwsConfig::builder().region("us-east-1").build();
        assert!(matches!(config.sdk_config(), Err(AwsError::Config(_))));

        let config = AwsConfig::builder().explicit_credentials("a", "b").build();
        assert!(matches!(config.sdk_config(), Err(AwsError::Config(_))));
    }

    #[test]
    fn test_builder() {
        let config = AwsConfig::builder()
            .region("us-east-1")
            .explicit_credentials("AKIDEXAMPLE", "secret")
            .session_token("token")
            .endpoint_url("http://localhost:4566")
            .build();

        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:4566"));
        assert_eq!(
            config.credentials.as_ref().and_then(|c| c.session_token.as_deref()),
            Some("token")
        );

        let sdk = config.sdk_config().unwrap();
        assert_eq!(sdk.region().map(|r| r.as_ref()), Some("us-east-1"));
    }
}
