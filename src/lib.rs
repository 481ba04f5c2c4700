// Nimbus - configuration-driven AWS service facades
//
// This library wires a configuration source to thin per-service facades
// (S3, DynamoDB, SQS, SNS, SES, Cognito, AppSync) behind feature flags.

// Re-export configuration
pub use nimbus_config;
pub use nimbus_config::{ConfigError, ConfigService, FileFormat};

// Re-export AWS facades
pub use nimbus_aws;
pub use nimbus_aws::{AwsConfig, AwsError, AwsServices, AwsServicesBuilder};

#[cfg(feature = "s3")]
pub use nimbus_aws::S3Service;

#[cfg(feature = "dynamodb")]
pub use nimbus_aws::DynamoDbService;

#[cfg(feature = "sqs")]
pub use nimbus_aws::SqsService;

#[cfg(feature = "sns")]
pub use nimbus_aws::SnsService;

#[cfg(feature = "ses")]
pub use nimbus_aws::SesService;

#[cfg(feature = "cognito")]
pub use nimbus_aws::CognitoService;

#[cfg(feature = "appsync")]
pub use nimbus_aws::AppSyncService;

// Prelude for common imports
pub mod prelude {
    pub use nimbus_aws::prelude::*;
    pub use nimbus_config::{ConfigService, FileFormat};
}
