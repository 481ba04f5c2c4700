//! # Nimbus AWS
//!
//! Thin facades over the AWS SDK: one client per service, built once from
//! configuration, one SDK call per operation.
//!
//! ## Features
//!
//! Each facade compiles only when its feature is enabled (`s3`, `dynamodb`,
//! `sqs`, `sns`, `ses`, `cognito`, `appsync`, or the `storage`, `messaging`
//! and `identity` groups). `all` is the default.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nimbus_aws::AwsServices;
//! use nimbus_config::ConfigService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // AWS_REGION, AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, AWS_S3_BUCKET, ...
//!     let config = ConfigService::from_env()?;
//!
//!     let services = AwsServices::builder()
//!         .enable_s3()
//!         .enable_dynamodb()
//!         .build(&config)?;
//!
//!     let s3 = services.s3()?;
//!     if !s3.file_exists("reports/latest.csv").await? {
//!         s3.upload_file("reports/latest.csv", "id,total\n", "text/csv", None).await?;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Errors
//!
//! Construction fails with [`AwsError::Config`] before any client exists when
//! a required key is missing. Every fault raised by an SDK call is returned as
//! [`AwsError::Upstream`], unclassified, with the SDK error as its source.

mod config;
mod error;
mod services;

#[cfg(any(feature = "sqs", feature = "sns"))]
pub mod attributes;

#[cfg(feature = "s3")]
pub mod s3;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

#[cfg(feature = "sqs")]
pub mod sqs;

#[cfg(feature = "sns")]
pub mod sns;

#[cfg(feature = "ses")]
pub mod ses;

#[cfg(feature = "cognito")]
pub mod cognito;

#[cfg(feature = "appsync")]
pub mod appsync;

pub use config::{AwsConfig, AwsConfigBuilder, StaticCredentials, keys};
pub use error::{AwsError, BoxError, Result};
pub use services::{AwsServices, AwsServicesBuilder};

#[cfg(feature = "s3")]
pub use s3::S3Service;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbService;

#[cfg(feature = "sqs")]
pub use sqs::SqsService;

#[cfg(feature = "sns")]
pub use sns::SnsService;

#[cfg(feature = "ses")]
pub use ses::SesService;

#[cfg(feature = "cognito")]
pub use cognito::CognitoService;

#[cfg(feature = "appsync")]
pub use appsync::AppSyncService;

// Re-export AWS types for convenience
pub use aws_config;
pub use aws_credential_types;
pub use aws_types;

// Re-export enabled service clients
#[cfg(feature = "s3")]
pub use aws_sdk_s3;

#[cfg(feature = "dynamodb")]
pub use aws_sdk_dynamodb;

#[cfg(feature = "sqs")]
pub use aws_sdk_sqs;

#[cfg(feature = "sns")]
pub use aws_sdk_sns;

#[cfg(feature = "ses")]
pub use aws_sdk_sesv2;

#[cfg(feature = "cognito")]
pub use aws_sdk_cognito_idp as aws_sdk_cognito;

#[cfg(feature = "appsync")]
pub use aws_sdk_appsync;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{AwsConfig, AwsError, AwsServices, Result};

    #[cfg(feature = "s3")]
    pub use crate::s3::S3Service;

    #[cfg(feature = "dynamodb")]
    pub use crate::dynamodb::{Cursor, DynamoDbService, Item, Page, QueryOptions, Value};

    #[cfg(feature = "sqs")]
    pub use crate::sqs::{ReceiveOptions, SqsService};

    #[cfg(feature = "sns")]
    pub use crate::sns::SnsService;

    #[cfg(any(feature = "sqs", feature = "sns"))]
    pub use crate::attributes::MessageAttribute;

    #[cfg(feature = "ses")]
    pub use crate::ses::{EmailOptions, Recipient, SesService};

    #[cfg(feature = "cognito")]
    pub use crate::cognito::CognitoService;

    #[cfg(feature = "appsync")]
    pub use crate::appsync::{AppSyncService, GraphqlApiOptions};
}
