//! AWS error types.

use std::error::Error as StdError;
use std::fmt::Write as _;

use nimbus_config::ConfigError;
use thiserror::Error;

/// Boxed upstream fault, usually an `SdkError<OperationError, HttpResponse>`.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result type for AWS operations.
pub type Result<T> = std::result::Result<T, AwsError>;

/// AWS facade errors.
///
/// Provider faults are never classified here: auth failures, throttling,
/// validation errors and missing resources all arrive as [`AwsError::Upstream`]
/// carrying the SDK's own error value.
#[derive(Debug, Error)]
pub enum AwsError {
    /// Fault raised by the provider SDK or the service behind it.
    #[error("{service} {operation} failed: {}", render_chain(.source))]
    Upstream {
        service: &'static str,
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    /// Missing or invalid configuration at construction time.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Facade was not enabled on the services container.
    #[error("Service '{0}' is not configured. Call enable_{0}() on the AwsServices builder")]
    ServiceNotConfigured(&'static str),

    /// An SDK request builder rejected the arguments before sending.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Attribute value the wire encoding cannot represent.
    #[error("Marshalling error: {0}")]
    Marshalling(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AwsError {
    /// Wrap an upstream fault for `service`/`operation`.
    ///
    /// Meant for `map_err`: `.map_err(AwsError::upstream("s3", "PutObject"))`.
    pub fn upstream<E>(service: &'static str, operation: &'static str) -> impl FnOnce(E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        move |source| Self::Upstream {
            service,
            operation,
            source: Box::new(source),
        }
    }

    /// Create an invalid request error.
    pub fn invalid_request(err: impl std::fmt::Display) -> Self {
        Self::InvalidRequest(err.to_string())
    }

    /// Create a service not configured error.
    pub fn not_configured(service: &'static str) -> Self {
        Self::ServiceNotConfigured(service)
    }

    /// Whether this error came from the provider.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream { .. })
    }

    /// Service and operation of an upstream fault.
    pub fn operation(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Upstream {
                service, operation, ..
            } => Some((*service, *operation)),
            _ => None,
        }
    }

    /// Borrow the upstream fault as a concrete SDK error type.
    ///
    /// ```rust,ignore
    /// use aws_sdk_dynamodb::{error::SdkError, operation::get_item::GetItemError};
    ///
    /// if let Some(SdkError::ServiceError(e)) =
    ///     err.downcast_upstream::<SdkError<GetItemError, _>>()
    /// {
    ///     println!("{:?}", e.err());
    /// }
    /// ```
    pub fn downcast_upstream<T: StdError + 'static>(&self) -> Option<&T> {
        match self {
            Self::Upstream { source, .. } => source.downcast_ref::<T>(),
            _ => None,
        }
    }
}

/// Render an error and its sources as `outer: inner: innermost`.
fn render_chain(err: &BoxError) -> String {
    let mut rendered = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        let text = cause.to_string();
        if !rendered.ends_with(&text) {
            let _ = write!(rendered, ": {}", text);
        }
        current = cause.source();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("service error")]
    struct Outer(#[source] Inner);

    #[derive(Debug, Error)]
    #[error("ResourceNotFoundException: table missing")]
    struct Inner;

    #[test]
    fn test_upstream_renders_source_chain() {
        let err = AwsError::upstream("dynamodb", "GetItem")(Outer(Inner));

        assert!(err.is_upstream());
        assert_eq!(err.operation(), Some(("dynamodb", "GetItem")));
        assert_eq!(
            err.to_string(),
            "dynamodb GetItem failed: service error: ResourceNotFoundException: table missing"
        );
    }

    #[test]
    fn test_downcast_upstream() {
        let err = AwsError::upstream("sqs", "SendMessage")(Outer(Inner));

        assert!(err.downcast_upstream::<Outer>().is_some());
        assert!(err.downcast_upstream::<Inner>().is_none());
        assert!(AwsError::not_configured("s3").downcast_upstream::<Outer>().is_none());
    }

    #[test]
    fn test_config_error_conversion() {
        let err: AwsError = ConfigError::KeyNotFound("AWS_REGION".to_string()).into();
        assert!(matches!(err, AwsError::Config(_)));
        assert!(err.to_string().contains("AWS_REGION"));
        assert!(!err.is_upstream());
    }
}
