//! Integration tests for nimbus-config

use nimbus_config::*;
use std::env;
use std::io::Write;

#[test]
fn test_prefixed_env_is_loaded_with_stripped_keys() {
    unsafe {
        env::set_var("NIMBUS_IT_AWS_REGION", "ap-southeast-2");
    }

    let config = ConfigService::builder()
        .with_prefix("NIMBUS_IT")
        .load_env()
        .build()
        .unwrap();

    assert_eq!(config.require("AWS_REGION").unwrap(), "ap-southeast-2");
    assert!(!config.has("NIMBUS_IT_AWS_REGION"));

    unsafe {
        env::remove_var("NIMBUS_IT_AWS_REGION");
    }
}

#[test]
fn test_dotenv_file_feeds_environment() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "NIMBUS_DOTENV_AWS_S3_BUCKET=dotenv-bucket").unwrap();
    writeln!(file, "# ignored").unwrap();

    let config = ConfigService::builder()
        .with_prefix("NIMBUS_DOTENV")
        .load_dotenv(Some(file.path().to_path_buf()))
        .build()
        .unwrap();

    assert_eq!(config.require("AWS_S3_BUCKET").unwrap(), "dotenv-bucket");

    unsafe {
        env::remove_var("NIMBUS_DOTENV_AWS_S3_BUCKET");
    }
}

#[test]
fn test_toml_file_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nimbus.toml");
    std::fs::write(
        &path,
        "AWS_REGION = \"us-east-2\"\nAWS_SES_SENDER_EMAIL = \"ops@example.com\"\nMAX_KEYS = 250\n",
    )
    .unwrap();

    let config = ConfigService::builder()
        .add_file(&path, FileFormat::Toml)
        .build()
        .unwrap();

    assert_eq!(config.require("AWS_REGION").unwrap(), "us-east-2");
    assert_eq!(config.get_int("MAX_KEYS").unwrap(), 250);
    assert_eq!(config.require("MAX_KEYS").unwrap(), "250");
}

#[test]
fn test_unreadable_file_is_a_load_error() {
    let result = ConfigService::builder()
        .add_file("/no/such/nimbus.json", FileFormat::Json)
        .build();

    assert!(matches!(result, Err(ConfigError::LoadError(_))));
}

#[cfg(unix)]
#[test]
fn test_non_utf8_environment_does_not_abort_startup() {
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;

    unsafe {
        env::set_var("NIMBUS_BAD_BYTES", OsString::from_vec(vec![0xff, 0xfe]));
        env::set_var("NIMBUS_GOOD_REGION", "eu-north-1");
    }

    let config = ConfigService::builder().load_env().build().unwrap();
    assert_eq!(config.require("NIMBUS_GOOD_REGION").unwrap(), "eu-north-1");
    assert!(!config.has("NIMBUS_BAD_BYTES"));

    unsafe {
        env::remove_var("NIMBUS_BAD_BYTES");
        env::remove_var("NIMBUS_GOOD_REGION");
    }
}

#[test]
fn test_config_error_display() {
    let err = ConfigError::KeyNotFound("AWS_SQS_QUEUE_URL".to_string());
    assert_eq!(
        err.to_string(),
        "Configuration key not found: AWS_SQS_QUEUE_URL"
    );
}
