//! SQS queue facade bound to one queue URL.

use std::collections::HashMap;

use aws_sdk_sqs::Client;
use aws_sdk_sqs::operation::delete_message::DeleteMessageOutput;
use aws_sdk_sqs::operation::delete_message_batch::DeleteMessageBatchOutput;
use aws_sdk_sqs::operation::get_queue_attributes::GetQueueAttributesOutput;
use aws_sdk_sqs::operation::receive_message::ReceiveMessageOutput;
use aws_sdk_sqs::operation::send_message::SendMessageOutput;
use aws_sdk_sqs::operation::send_message_batch::SendMessageBatchOutput;
use aws_sdk_sqs::primitives::Blob;
use aws_sdk_sqs::types::{
    DeleteMessageBatchRequestEntry, MessageAttributeValue, QueueAttributeName,
    SendMessageBatchRequestEntry,
};
use nimbus_config::ConfigService;
use tracing::{debug, info};

use crate::attributes::{MessageAttribute, wire_attributes};
use crate::{AwsConfig, AwsError, Result};

const SERVICE: &str = "sqs";

/// Configuration key holding the queue URL.
pub const QUEUE_URL_KEY: &str = "AWS_SQS_QUEUE_URL";

/// Receive parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveOptions {
    pub max_number_of_messages: i32,
    /// Seconds a received message stays hidden from other consumers.
    pub visibility_timeout: i32,
    /// Long-poll duration in seconds; 0 returns immediately.
    pub wait_time_seconds: i32,
}

impl Default for ReceiveOptions {
    fn default() -> Self {
        Self {
            max_number_of_messages: 10,
            visibility_timeout: 30,
            wait_time_seconds: 0,
        }
    }
}

/// Entry of a batch send.
#[derive(Debug, Clone)]
pub struct SendBatchEntry {
    pub id: String,
    pub message_body: String,
    pub delay_seconds: Option<i32>,
}

impl SendBatchEntry {
    pub fn new(id: impl Into<String>, message_body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message_body: message_body.into(),
            delay_seconds: None,
        }
    }

    pub fn with_delay(mut self, seconds: i32) -> Self {
        self.delay_seconds = Some(seconds);
        self
    }
}

/// Entry of a batch delete.
#[derive(Debug, Clone)]
pub struct DeleteBatchEntry {
    pub id: String,
    pub receipt_handle: String,
}

impl DeleteBatchEntry {
    pub fn new(id: impl Into<String>, receipt_handle: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            receipt_handle: receipt_handle.into(),
        }
    }
}

/// SQS facade.
#[derive(Debug, Clone)]
pub struct SqsService {
    client: Client,
    queue_url: String,
}

impl SqsService {
    /// Build the client from configuration.
    pub fn new(config: &ConfigService) -> Result<Self> {
        let queue_url = config.require(QUEUE_URL_KEY)?;
        let sdk_config = AwsConfig::from_config(config)?.sdk_config()?;
        let client = Client::new(&sdk_config);

        info!(queue_url = %queue_url, "SQS client initialized");
        Ok(Self { client, queue_url })
    }

    /// Create from an existing AWS SDK client.
    pub fn from_client(client: Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }

    /// Underlying SDK client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Queue this facade operates on.
    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }

    /// Send one message.
    pub async fn send_message(
        &self,
        body: &str,
        delay_seconds: i32,
        attributes: Option<HashMap<String, MessageAttribute>>,
    ) -> Result<SendMessageOutput> {
        debug!(queue_url = %self.queue_url, delay_seconds, "SQS SendMessage");

        let attributes = attributes.map(|a| message_attributes(&a)).transpose()?;

        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .delay_seconds(delay_seconds)
            .set_message_attributes(attributes)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "SendMessage"))
    }

    /// Receive up to `max_number_of_messages` messages.
    pub async fn receive_messages(&self, options: ReceiveOptions) -> Result<ReceiveMessageOutput> {
        debug!(queue_url = %self.queue_url, ?options, "SQS ReceiveMessage");

        self.client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(options.max_number_of_messages)
            .visibility_timeout(options.visibility_timeout)
            .wait_time_seconds(options.wait_time_seconds)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "ReceiveMessage"))
    }

    /// Delete a processed message.
    pub async fn delete_message(&self, receipt_handle: &str) -> Result<DeleteMessageOutput> {
        debug!(queue_url = %self.queue_url, "SQS DeleteMessage");

        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "DeleteMessage"))
    }

    /// Read queue attributes. An empty list asks for all of them.
    pub async fn get_queue_attributes(
        &self,
        names: &[QueueAttributeName],
    ) -> Result<GetQueueAttributesOutput> {
        debug!(queue_url = %self.queue_url, ?names, "SQS GetQueueAttributes");

        let names = if names.is_empty() {
            vec![QueueAttributeName::All]
        } else {
            names.to_vec()
        };

        self.client
            .get_queue_attributes()
            .queue_url(&self.queue_url)
            .set_attribute_names(Some(names))
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "GetQueueAttributes"))
    }

    /// Send up to ten messages in one call.
    ///
    /// Per-entry failures are reported in the output, not as an error.
    pub async fn send_message_batch(
        &self,
        entries: Vec<SendBatchEntry>,
    ) -> Result<SendMessageBatchOutput> {
        debug!(queue_url = %self.queue_url, entries = entries.len(), "SQS SendMessageBatch");

        let entries = entries
            .into_iter()
            .map(|entry| {
                SendMessageBatchRequestEntry::builder()
                    .id(entry.id)
                    .message_body(entry.message_body)
                    .set_delay_seconds(entry.delay_seconds)
                    .build()
                    .map_err(AwsError::invalid_request)
            })
            .collect::<Result<Vec<_>>>()?;

        self.client
            .send_message_batch()
            .queue_url(&self.queue_url)
            .set_entries(Some(entries))
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "SendMessageBatch"))
    }

    /// Delete up to ten messages in one call.
    pub async fn delete_message_batch(
        &self,
        entries: Vec<DeleteBatchEntry>,
    ) -> Result<DeleteMessageBatchOutput> {
        debug!(queue_url = %self.queue_url, entries = entries.len(), "SQS DeleteMessageBatch");

        let entries = entries
            .into_iter()
            .map(|entry| {
                DeleteMessageBatchRequestEntry::builder()
                    .id(entry.id)
                    .receipt_handle(entry.receipt_handle)
                    .build()
                    .map_err(AwsError::invalid_request)
            })
            .collect::<Result<Vec<_>>>()?;

        self.client
            .delete_message_batch()
            .queue_url(&self.queue_url)
            .set_entries(Some(entries))
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "DeleteMessageBatch"))
    }
}

wire_attributes!(MessageAttributeValue, Blob);

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_receive_defaults() {
        let options = ReceiveOptions::default();
        assert_eq!(options.max_number_of_messages, 10);
        assert_eq!(options.visibility_timeout, 30);
        assert_eq!(options.wait_time_seconds, 0);
    }

    #[test]
    fn test_message_attributes() {
        let mut attributes = HashMap::new();
        attributes.insert("kind".to_string(), MessageAttribute::from("order"));
        attributes.insert("attempt".to_string(), MessageAttribute::number(2));
        attributes.insert(
            "sig".to_string(),
            MessageAttribute::Binary(Bytes::from_static(&[7, 8])),
        );

        let wire = message_attributes(&attributes).unwrap();

        assert_eq!(wire["kind"].data_type(), "String");
        assert_eq!(wire["kind"].string_value(), Some("order"));
        assert_eq!(wire["attempt"].data_type(), "Number");
        assert_eq!(wire["attempt"].string_value(), Some("2"));
        assert_eq!(wire["sig"].data_type(), "Binary");
        assert_eq!(wire["sig"].binary_value().cloned().map(Blob::into_inner), Some(vec![7, 8]));
        assert!(wire["sig"].string_value().is_none());
    }

    #[test]
    fn test_batch_entry_builders() {
        let entry = SendBatchEntry::new("1", "hello").with_delay(5);
        assert_eq!(entry.delay_seconds, Some(5));
        assert_eq!(DeleteBatchEntry::new("1", "rh").receipt_handle, "rh");
    }
}
