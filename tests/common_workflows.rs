//! Integration tests for common Nimbus workflows.
//!
//! These tests wire configuration files to the service container the way an
//! application does at startup. No request leaves the process.

use std::io::Write;

use nimbus::prelude::*;
use nimbus::{AwsServices, ConfigError};

// =============================================================================
// Startup from files
// =============================================================================

#[test]
fn test_services_from_dotenv_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "AWS_REGION=eu-central-1").unwrap();
    writeln!(file, "AWS_ACCESS_KEY_ID=AKIDEXAMPLE").unwrap();
    writeln!(file, "AWS_SECRET_ACCESS_KEY=secret").unwrap();
    writeln!(file, "AWS_S3_BUCKET=media").unwrap();
    writeln!(file, "AWS_SES_SENDER_EMAIL=hello@example.com").unwrap();

    let config = ConfigService::builder()
        .add_file(file.path(), FileFormat::Env)
        .build()
        .unwrap();

    let services = AwsServices::builder()
        .enable_s3()
        .enable_ses()
        .enable_dynamodb()
        .build(&config)
        .unwrap();

    assert_eq!(services.s3().unwrap().bucket(), "media");
    assert_eq!(
        services.s3().unwrap().public_url("a.png"),
        "https://media.s3.eu-central-1.amazonaws.com/a.png"
    );
    assert_eq!(services.ses().unwrap().default_sender(), "hello@example.com");
    assert!(services.dynamodb().is_ok());
}

#[test]
fn test_services_from_toml_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "AWS_REGION = \"us-west-2\"").unwrap();
    writeln!(file, "AWS_ACCESS_KEY_ID = \"AKIDEXAMPLE\"").unwrap();
    writeln!(file, "AWS_SECRET_ACCESS_KEY = \"secret\"").unwrap();
    writeln!(file, "AWS_COGNITO_USER_POOL_ID = \"us-west-2_pool\"").unwrap();
    writeln!(file, "AWS_COGNITO_CLIENT_ID = \"app\"").unwrap();

    let config = ConfigService::builder()
        .add_file(file.path(), FileFormat::Toml)
        .build()
        .unwrap();

    let services = AwsServices::builder()
        .enable_cognito()
        .enable_appsync()
        .build(&config)
        .unwrap();

    let cognito = services.cognito().unwrap();
    assert_eq!(cognito.user_pool_id(), "us-west-2_pool");
    assert_eq!(cognito.client_id(), "app");
    assert!(services.appsync().is_ok());
    assert!(services.sqs().is_err());
}

// =============================================================================
// Startup failures
// =============================================================================

#[test]
fn test_blank_required_key_aborts_startup() {
    let config = ConfigService::builder()
        .set("AWS_REGION", "us-east-1")
        .set("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE")
        .set("AWS_SECRET_ACCESS_KEY", "secret")
        .set("AWS_SQS_QUEUE_URL", "   ")
        .build()
        .unwrap();

    let err = AwsServices::builder()
        .enable_sns()
        .enable_sqs()
        .build(&config)
        .unwrap_err();

    match err {
        AwsError::Config(ConfigError::KeyNotFound(key)) => assert_eq!(key, "AWS_SQS_QUEUE_URL"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_explicit_values_override_files() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "AWS_REGION=eu-west-1").unwrap();
    writeln!(file, "AWS_ACCESS_KEY_ID=AKIDEXAMPLE").unwrap();
    writeln!(file, "AWS_SECRET_ACCESS_KEY=secret").unwrap();
    writeln!(file, "AWS_S3_BUCKET=from-file").unwrap();

    let config = ConfigService::builder()
        .add_file(file.path(), FileFormat::Env)
        .set("AWS_S3_BUCKET", "from-code")
        .build()
        .unwrap();

    let services = AwsServices::builder().enable_s3().build(&config).unwrap();
    assert_eq!(services.s3().unwrap().bucket(), "from-code");
}
