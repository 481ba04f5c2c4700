//! S3 object storage facade bound to one bucket.

use std::collections::HashMap;
use std::time::Duration;

use aws_sdk_s3::Client;
use aws_sdk_s3::operation::copy_object::CopyObjectOutput;
use aws_sdk_s3::operation::delete_object::DeleteObjectOutput;
use aws_sdk_s3::operation::get_object::GetObjectOutput;
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
use aws_sdk_s3::operation::put_object::PutObjectOutput;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use nimbus_config::ConfigService;
use tracing::{debug, info};

use crate::{AwsConfig, AwsError, Result};

const SERVICE: &str = "s3";

/// Configuration key holding the bucket name.
pub const BUCKET_KEY: &str = "AWS_S3_BUCKET";

/// Default page size for [`S3Service::list_files`].
pub const DEFAULT_MAX_KEYS: i32 = 1000;

/// S3 facade.
#[derive(Debug, Clone)]
pub struct S3Service {
    client: Client,
    bucket: String,
    region: Option<String>,
    endpoint: Option<String>,
}

impl S3Service {
    /// Build the client from configuration.
    ///
    /// A custom endpoint switches to path-style addressing.
    pub fn new(config: &ConfigService) -> Result<Self> {
        let bucket = config.require(BUCKET_KEY)?;
        let aws = AwsConfig::from_config(config)?;
        let sdk_config = aws.sdk_config()?;

        let mut s3_config = aws_sdk_s3::config::Builder::from(&sdk_config);
        if aws.endpoint_url.is_some() {
            s3_config = s3_config.force_path_style(true);
        }
        let client = Client::from_conf(s3_config.build());

        info!(bucket = %bucket, "S3 client initialized");

        Ok(Self {
            client,
            bucket,
            region: aws.region,
            endpoint: aws.endpoint_url,
        })
    }

    /// Create from an existing AWS SDK client.
    pub fn from_client(client: Client, bucket: impl Into<String>) -> Self {
        let region = client.config().region().map(|r| r.to_string());
        Self {
            client,
            bucket: bucket.into(),
            region,
            endpoint: None,
        }
    }

    /// Underlying SDK client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Bucket this facade operates on.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Upload an object.
    pub async fn upload_file(
        &self,
        key: &str,
        body: impl Into<Bytes>,
        content_type: &str,
        metadata: Option<HashMap<String, String>>,
    ) -> Result<PutObjectOutput> {
        let body = body.into();
        debug!(key, bucket = %self.bucket, size = body.len(), "S3 PutObject");

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .set_metadata(metadata)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "PutObject"))
    }

    /// Fetch an object. The body is returned as a stream, unread.
    pub async fn get_file(&self, key: &str) -> Result<GetObjectOutput> {
        debug!(key, bucket = %self.bucket, "S3 GetObject");

        self.client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "GetObject"))
    }

    /// Delete an object.
    pub async fn delete_file(&self, key: &str) -> Result<DeleteObjectOutput> {
        debug!(key, bucket = %self.bucket, "S3 DeleteObject");

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "DeleteObject"))
    }

    /// List objects under a prefix, one page at a time.
    ///
    /// `max_keys` defaults to [`DEFAULT_MAX_KEYS`].
    pub async fn list_files(
        &self,
        prefix: Option<&str>,
        max_keys: Option<i32>,
        continuation_token: Option<String>,
    ) -> Result<ListObjectsV2Output> {
        debug!(?prefix, bucket = %self.bucket, "S3 ListObjectsV2");

        self.client
            .list_objects_v2()
            .bucket(&self.bucket)
            .set_prefix(prefix.map(str::to_string))
            .max_keys(max_keys.unwrap_or(DEFAULT_MAX_KEYS))
            .set_continuation_token(continuation_token)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "ListObjectsV2"))
    }

    /// Check whether an object exists.
    ///
    /// Only a `NotFound` answer means `false`; auth, throttling and transport
    /// faults are returned as errors.
    pub async fn file_exists(&self, key: &str) -> Result<bool> {
        debug!(key, bucket = %self.bucket, "S3 HeadObject");

        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => Err(AwsError::upstream(SERVICE, "HeadObject")(e)),
        }
    }

    /// Copy an object within the bucket.
    pub async fn copy_file(&self, source_key: &str, destination_key: &str) -> Result<CopyObjectOutput> {
        debug!(source_key, destination_key, bucket = %self.bucket, "S3 CopyObject");

        self.client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(copy_source(&self.bucket, source_key))
            .key(destination_key)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "CopyObject"))
    }

    /// Generate a SigV4 presigned GET URL valid for `expires_in`.
    ///
    /// Signing happens locally; no request is sent.
    pub async fn presigned_url(&self, key: &str, expires_in: Duration) -> Result<String> {
        let presigning = PresigningConfig::expires_in(expires_in).map_err(AwsError::invalid_request)?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(AwsError::upstream(SERVICE, "GetObject"))?;

        Ok(request.uri().to_string())
    }

    /// Plain object URL. Only usable for public objects; it grants no access.
    pub fn public_url(&self, key: &str) -> String {
        if let Some(endpoint) = &self.endpoint {
            format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key)
        } else if let Some(region) = &self.region {
            format!("https://{}.s3.{}.amazonaws.com/{}", self.bucket, region, key)
        } else {
            format!("https://{}.s3.amazonaws.com/{}", self.bucket, key)
        }
    }
}

/// `CopySource` value for an object in `bucket`. Key segments are
/// percent-encoded, separators are kept.
fn copy_source(bucket: &str, key: &str) -> String {
    let key = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/{}", bucket, key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(endpoint: Option<&str>) -> ConfigService {
        let mut builder = ConfigService::builder()
            .set("AWS_REGION", "sa-east-1")
            .set("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE")
            .set("AWS_SECRET_ACCESS_KEY", "secret")
            .set(BUCKET_KEY, "uploads");
        if let Some(endpoint) = endpoint {
            builder = builder.set("AWS_ENDPOINT_URL", endpoint);
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_missing_bucket_fails_construction() {
        let config = ConfigService::builder()
            .set("AWS_REGION", "sa-east-1")
            .set("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE")
            .set("AWS_SECRET_ACCESS_KEY", "secret")
            .build()
            .unwrap();

        let err = S3Service::new(&config).unwrap_err();
        assert!(err.to_string().contains(BUCKET_KEY));
    }

    #[test]
    fn test_copy_source_encodes_key() {
        assert_eq!(copy_source("uploads", "docs/a.pdf"), "uploads/docs/a.pdf");
        assert_eq!(
            copy_source("uploads", "reports/100%/q?1#2 final.csv"),
            "uploads/reports/100%25/q%3F1%232%20final.csv"
        );
    }

    #[test]
    fn test_public_url() {
        let s3 = S3Service::new(&config(None)).unwrap();
        assert_eq!(s3.bucket(), "uploads");
        assert_eq!(
            s3.public_url("docs/a.pdf"),
            "https://uploads.s3.sa-east-1.amazonaws.com/docs/a.pdf"
        );

        let local = S3Service::new(&config(Some("http://localhost:4566/"))).unwrap();
        assert_eq!(local.public_url("a.txt"), "http://localhost:4566/uploads/a.txt");
    }

    #[tokio::test]
    async fn test_presigned_url_is_signed() {
        let s3 = S3Service::new(&config(None)).unwrap();
        let url = s3
            .presigned_url("reports/q1.csv", Duration::from_secs(900))
            .await
            .unwrap();

        assert!(url.starts_with("https://uploads.s3.sa-east-1.amazonaws.com/reports/q1.csv?"));
        assert!(url.contains("X-Amz-Signature="));
        assert!(url.contains("X-Amz-Expires=900"));
    }

    #[tokio::test]
    async fn test_presigned_url_rejects_long_expiry() {
        let s3 = S3Service::new(&config(None)).unwrap();
        let result = s3
            .presigned_url("a.txt", Duration::from_secs(8 * 24 * 3600))
            .await;

        assert!(matches!(result, Err(AwsError::InvalidRequest(_))));
    }
}
