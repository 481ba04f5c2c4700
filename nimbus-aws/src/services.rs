//! Composition root holding one facade per enabled service.

use std::sync::Arc;

use nimbus_config::ConfigService;
use tracing::info;

#[cfg(feature = "appsync")]
use crate::appsync::AppSyncService;
#[cfg(feature = "cognito")]
use crate::cognito::CognitoService;
#[cfg(feature = "dynamodb")]
use crate::dynamodb::DynamoDbService;
#[cfg(feature = "s3")]
use crate::s3::S3Service;
#[cfg(feature = "ses")]
use crate::ses::SesService;
#[cfg(feature = "sns")]
use crate::sns::SnsService;
#[cfg(feature = "sqs")]
use crate::sqs::SqsService;
#[allow(unused_imports)]
use crate::{AwsError, Result};

/// Container for the service facades.
///
/// Every enabled facade is built up front by [`AwsServicesBuilder::build`],
/// so a missing configuration key aborts startup instead of the first call.
/// The container is immutable afterwards and meant to be shared behind an
/// `Arc`.
#[derive(Debug, Default)]
pub struct AwsServices {
    #[cfg(feature = "s3")]
    s3: Option<S3Service>,
    #[cfg(feature = "dynamodb")]
    dynamodb: Option<DynamoDbService>,
    #[cfg(feature = "sqs")]
    sqs: Option<SqsService>,
    #[cfg(feature = "sns")]
    sns: Option<SnsService>,
    #[cfg(feature = "ses")]
    ses: Option<SesService>,
    #[cfg(feature = "cognito")]
    cognito: Option<CognitoService>,
    #[cfg(feature = "appsync")]
    appsync: Option<AppSyncService>,
}

impl AwsServices {
    /// Create a builder.
    pub fn builder() -> AwsServicesBuilder {
        AwsServicesBuilder::default()
    }

    /// Names of the facades this container holds.
    pub fn enabled(&self) -> Vec<&'static str> {
        #[allow(unused_mut)]
        let mut names = Vec::new();
        #[cfg(feature = "s3")]
        if self.s3.is_some() {
            names.push("s3");
        }
        #[cfg(feature = "dynamodb")]
        if self.dynamodb.is_some() {
            names.push("dynamodb");
        }
        #[cfg(feature = "sqs")]
        if self.sqs.is_some() {
            names.push("sqs");
        }
        #[cfg(feature = "sns")]
        if self.sns.is_some() {
            names.push("sns");
        }
        #[cfg(feature = "ses")]
        if self.ses.is_some() {
            names.push("ses");
        }
        #[cfg(feature = "cognito")]
        if self.cognito.is_some() {
            names.push("cognito");
        }
        #[cfg(feature = "appsync")]
        if self.appsync.is_some() {
            names.push("appsync");
        }
        names
    }

    /// Get the S3 facade.
    #[cfg(feature = "s3")]
    pub fn s3(&self) -> Result<&S3Service> {
        self.s3.as_ref().ok_or_else(|| AwsError::not_configured("s3"))
    }

    /// Get the DynamoDB facade.
    #[cfg(feature = "dynamodb")]
    pub fn dynamodb(&self) -> Result<&DynamoDbService> {
        self.dynamodb
            .as_ref()
            .ok_or_else(|| AwsError::not_configured("dynamodb"))
    }

    /// Get the SQS facade.
    #[cfg(feature = "sqs")]
    pub fn sqs(&self) -> Result<&SqsService> {
        self.sqs.as_ref().ok_or_else(|| AwsError::not_configured("sqs"))
    }

    /// Get the SNS facade.
    #[cfg(feature = "sns")]
    pub fn sns(&self) -> Result<&SnsService> {
        self.sns.as_ref().ok_or_else(|| AwsError::not_configured("sns"))
    }

    /// Get the SES facade.
    #[cfg(feature = "ses")]
    pub fn ses(&self) -> Result<&SesService> {
        self.ses.as_ref().ok_or_else(|| AwsError::not_configured("ses"))
    }

    /// Get the Cognito facade.
    #[cfg(feature = "cognito")]
    pub fn cognito(&self) -> Result<&CognitoService> {
        self.cognito
            .as_ref()
            .ok_or_else(|| AwsError::not_configured("cognito"))
    }

    /// Get the AppSync facade.
    #[cfg(feature = "appsync")]
    pub fn appsync(&self) -> Result<&AppSyncService> {
        self.appsync
            .as_ref()
            .ok_or_else(|| AwsError::not_configured("appsync"))
    }
}

/// Selects which facades [`AwsServices`] constructs.
#[derive(Debug, Clone, Default)]
pub struct AwsServicesBuilder {
    s3: bool,
    dynamodb: bool,
    sqs: bool,
    sns: bool,
    ses: bool,
    cognito: bool,
    appsync: bool,
}

impl AwsServicesBuilder {
    #[cfg(feature = "s3")]
    pub fn enable_s3(mut self) -> Self {
        self.s3 = true;
        self
    }

    #[cfg(feature = "dynamodb")]
    pub fn enable_dynamodb(mut self) -> Self {
        self.dynamodb = true;
        self
    }

    #[cfg(feature = "sqs")]
    pub fn enable_sqs(mut self) -> Self {
        self.sqs = true;
        self
    }

    #[cfg(feature = "sns")]
    pub fn enable_sns(mut self) -> Self {
        self.sns = true;
        self
    }

    #[cfg(feature = "ses")]
    pub fn enable_ses(mut self) -> Self {
        self.ses = true;
        self
    }

    #[cfg(feature = "cognito")]
    pub fn enable_cognito(mut self) -> Self {
        self.cognito = true;
        self
    }

    #[cfg(feature = "appsync")]
    pub fn enable_appsync(mut self) -> Self {
        self.appsync = true;
        self
    }

    /// Enable every facade compiled into this build.
    pub fn enable_all(self) -> Self {
        Self {
            s3: cfg!(feature = "s3"),
            dynamodb: cfg!(feature = "dynamodb"),
            sqs: cfg!(feature = "sqs"),
            sns: cfg!(feature = "sns"),
            ses: cfg!(feature = "ses"),
            cognito: cfg!(feature = "cognito"),
            appsync: cfg!(feature = "appsync"),
        }
    }

    /// Construct every enabled facade from `config`.
    ///
    /// Fails on the first facade whose configuration is incomplete.
    pub fn build(self, config: &ConfigService) -> Result<Arc<AwsServices>> {
        #[allow(unused_mut)]
        let mut services = AwsServices::default();

        #[cfg(feature = "s3")]
        if self.s3 {
            services.s3 = Some(S3Service::new(config)?);
        }
        #[cfg(feature = "dynamodb")]
        if self.dynamodb {
            services.dynamodb = Some(DynamoDbService::new(config)?);
        }
        #[cfg(feature = "sqs")]
        if self.sqs {
            services.sqs = Some(SqsService::new(config)?);
        }
        #[cfg(feature = "sns")]
        if self.sns {
            services.sns = Some(SnsService::new(config)?);
        }
        #[cfg(feature = "ses")]
        if self.ses {
            services.ses = Some(SesService::new(config)?);
        }
        #[cfg(feature = "cognito")]
        if self.cognito {
            services.cognito = Some(CognitoService::new(config)?);
        }
        #[cfg(feature = "appsync")]
        if self.appsync {
            services.appsync = Some(AppSyncService::new(config)?);
        }

        info!(services = ?services.enabled(), "AWS services initialized");
        Ok(Arc::new(services))
    }
}
