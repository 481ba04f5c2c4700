//! SNS pub/sub facade.
//!
//! Unlike the queue and storage facades this one is not bound to a resource;
//! every call names its topic or subscription.

use std::collections::HashMap;

use aws_sdk_sns::Client;
use aws_sdk_sns::operation::create_topic::CreateTopicOutput;
use aws_sdk_sns::operation::delete_topic::DeleteTopicOutput;
use aws_sdk_sns::operation::list_subscriptions_by_topic::ListSubscriptionsByTopicOutput;
use aws_sdk_sns::operation::list_topics::ListTopicsOutput;
use aws_sdk_sns::operation::publish::PublishOutput;
use aws_sdk_sns::operation::subscribe::SubscribeOutput;
use aws_sdk_sns::operation::unsubscribe::UnsubscribeOutput;
use aws_sdk_sns::primitives::Blob;
use aws_sdk_sns::types::MessageAttributeValue;
use nimbus_config::ConfigService;
use tracing::{debug, info};

use crate::attributes::{MessageAttribute, wire_attributes};
use crate::{AwsConfig, AwsError, Result};

const SERVICE: &str = "sns";

/// SNS facade.
#[derive(Debug, Clone)]
pub struct SnsService {
    client: Client,
}

impl SnsService {
    /// Build the client from configuration.
    pub fn new(config: &ConfigService) -> Result<Self> {
        let sdk_config = AwsConfig::from_config(config)?.sdk_config()?;
        let client = Client::new(&sdk_config);

        info!(region = ?sdk_config.region(), "SNS client initialized");
        Ok(Self { client })
    }

    /// Create from an existing AWS SDK client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Underlying SDK client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Publish a message to a topic.
    pub async fn publish(
        &self,
        topic_arn: &str,
        message: &str,
        subject: Option<&str>,
        attributes: Option<HashMap<String, MessageAttribute>>,
    ) -> Result<PublishOutput> {
        debug!(topic_arn, "SNS Publish");

        let attributes = attributes.map(|a| message_attributes(&a)).transpose()?;

        self.client
            .publish()
            .topic_arn(topic_arn)
            .message(message)
            .set_subject(subject.map(str::to_string))
            .set_message_attributes(attributes)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "Publish"))
    }

    /// Create a topic (idempotent on the service side).
    pub async fn create_topic(
        &self,
        name: &str,
        attributes: Option<HashMap<String, String>>,
    ) -> Result<CreateTopicOutput> {
        debug!(name, "SNS CreateTopic");

        self.client
            .create_topic()
            .name(name)
            .set_attributes(attributes)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "CreateTopic"))
    }

    pub async fn delete_topic(&self, topic_arn: &str) -> Result<DeleteTopicOutput> {
        debug!(topic_arn, "SNS DeleteTopic");

        self.client
            .delete_topic()
            .topic_arn(topic_arn)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "DeleteTopic"))
    }

    /// Subscribe an endpoint.
    ///
    /// `protocol` is one of the SNS protocols (`email`, `sms`, `http`,
    /// `https`, `sqs`, `lambda`, ...).
    pub async fn subscribe(
        &self,
        topic_arn: &str,
        protocol: &str,
        endpoint: &str,
        attributes: Option<HashMap<String, String>>,
    ) -> Result<SubscribeOutput> {
        debug!(topic_arn, protocol, "SNS Subscribe");

        self.client
            .subscribe()
            .topic_arn(topic_arn)
            .protocol(protocol)
            .endpoint(endpoint)
            .set_attributes(attributes)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "Subscribe"))
    }

    pub async fn unsubscribe(&self, subscription_arn: &str) -> Result<UnsubscribeOutput> {
        debug!(subscription_arn, "SNS Unsubscribe");

        self.client
            .unsubscribe()
            .subscription_arn(subscription_arn)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "Unsubscribe"))
    }

    /// One page of a topic's subscriptions.
    pub async fn list_subscriptions_by_topic(
        &self,
        topic_arn: &str,
        next_token: Option<String>,
    ) -> Result<ListSubscriptionsByTopicOutput> {
        debug!(topic_arn, "SNS ListSubscriptionsByTopic");

        self.client
            .list_subscriptions_by_topic()
            .topic_arn(topic_arn)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "ListSubscriptionsByTopic"))
    }

    /// One page of the account's topics.
    pub async fn list_topics(&self, next_token: Option<String>) -> Result<ListTopicsOutput> {
        debug!("SNS ListTopics");

        self.client
            .list_topics()
            .set_next_token(next_token)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "ListTopics"))
    }
}

wire_attributes!(MessageAttributeValue, Blob);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_attributes() {
        let mut attributes = HashMap::new();
        attributes.insert("event".to_string(), MessageAttribute::from("user.created"));
        attributes.insert("version".to_string(), MessageAttribute::number(3));

        let wire = message_attributes(&attributes).unwrap();

        assert_eq!(wire.len(), 2);
        assert_eq!(wire["event"].data_type(), "String");
        assert_eq!(wire["event"].string_value(), Some("user.created"));
        assert_eq!(wire["version"].data_type(), "Number");
        assert!(wire["version"].binary_value().is_none());
    }
}
