//! DynamoDB key-value store facade.
//!
//! Items cross this boundary as plain [`Item`] maps and are marshalled to the
//! typed wire encoding per call. Reads reshape the response back into plain
//! items; everything else is returned as the SDK produced it.
//!
//! ```rust,ignore
//! let db = DynamoDbService::new(&config)?;
//! db.put_item("users", &item).await?;
//!
//! let mut page = db.scan("users", Some(100), None).await?;
//! while let Some(cursor) = page.cursor.take() {
//!     page = db.scan("users", Some(100), Some(cursor)).await?;
//! }
//! ```

mod marshal;
mod value;

pub use marshal::{Cursor, Page, WireItem, marshall, marshall_value, unmarshall, unmarshall_value};
pub use value::{Item, Number, Value, item_from_json};

use std::collections::HashMap;

use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemOutput;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemOutput;
use aws_sdk_dynamodb::operation::put_item::PutItemOutput;
use aws_sdk_dynamodb::types::{KeysAndAttributes, PutRequest, ReturnValue, WriteRequest};
use nimbus_config::ConfigService;
use tracing::{debug, info};

use crate::{AwsConfig, AwsError, Result};

const SERVICE: &str = "dynamodb";

/// Optional parts of a query.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Placeholders for attribute names (`#name` to `name`).
    pub expression_attribute_names: Option<HashMap<String, String>>,
    /// Secondary index to query instead of the table.
    pub index_name: Option<String>,
    /// Maximum number of items to evaluate.
    pub limit: Option<i32>,
    /// Resume after this cursor.
    pub start: Option<Cursor>,
}

/// DynamoDB facade.
#[derive(Debug, Clone)]
pub struct DynamoDbService {
    client: Client,
}

impl DynamoDbService {
    /// Build the client from configuration.
    pub fn new(config: &ConfigService) -> Result<Self> {
        let sdk_config = AwsConfig::from_config(config)?.sdk_config()?;
        let client = Client::new(&sdk_config);

        info!(region = ?sdk_config.region(), "DynamoDB client initialized");
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

    /// Create or replace an item.
    pub async fn put_item(&self, table: &str, item: &Item) -> Result<PutItemOutput> {
        debug!(table, "DynamoDB PutItem");

        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(marshall(item)))
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "PutItem"))
    }

    /// Fetch an item by primary key. `None` when no item matches.
    pub async fn get_item(&self, table: &str, key: &Item) -> Result<Option<Item>> {
        debug!(table, "DynamoDB GetItem");

        let output = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(marshall(key)))
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "GetItem"))?;

        output.item.map(unmarshall).transpose()
    }

    /// Delete an item by primary key.
    pub async fn delete_item(&self, table: &str, key: &Item) -> Result<DeleteItemOutput> {
        debug!(table, "DynamoDB DeleteItem");

        self.client
            .delete_item()
            .table_name(table)
            .set_key(Some(marshall(key)))
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "DeleteItem"))
    }

    /// Apply an update expression and return the item as it is afterwards.
    pub async fn update_item(
        &self,
        table: &str,
        key: &Item,
        update_expression: &str,
        values: &Item,
        names: Option<HashMap<String, String>>,
    ) -> Result<Option<Item>> {
        debug!(table, update_expression, "DynamoDB UpdateItem");

        let output = self
            .client
            .update_item()
            .table_name(table)
            .set_key(Some(marshall(key)))
            .update_expression(update_expression)
            .set_expression_attribute_values(non_empty(values))
            .set_expression_attribute_names(names)
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "UpdateItem"))?;

        output.attributes.map(unmarshall).transpose()
    }

    /// Read one page of the whole table.
    pub async fn scan(&self, table: &str, limit: Option<i32>, start: Option<Cursor>) -> Result<Page> {
        debug!(table, ?limit, resumed = start.is_some(), "DynamoDB Scan");

        let output = self
            .client
            .scan()
            .table_name(table)
            .set_limit(limit)
            .set_exclusive_start_key(start.map(Cursor::into_wire))
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "Scan"))?;

        Page::from_wire(output.items, output.last_evaluated_key)
    }

    /// Read one page of items matching a key condition.
    pub async fn query(
        &self,
        table: &str,
        key_condition_expression: &str,
        values: &Item,
        options: QueryOptions,
    ) -> Result<Page> {
        debug!(
            table,
            key_condition_expression,
            index = ?options.index_name,
            resumed = options.start.is_some(),
            "DynamoDB Query"
        );

        let output = self
            .client
            .query()
            .table_name(table)
            .key_condition_expression(key_condition_expression)
            .set_expression_attribute_values(non_empty(values))
            .set_expression_attribute_names(options.expression_attribute_names)
            .set_index_name(options.index_name)
            .set_limit(options.limit)
            .set_exclusive_start_key(options.start.map(Cursor::into_wire))
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "Query"))?;

        Page::from_wire(output.items, output.last_evaluated_key)
    }

    /// Put many items across one or more tables in a single call.
    ///
    /// Unprocessed items are reported in the output, untouched.
    pub async fn batch_write_items(
        &self,
        request_items: &HashMap<String, Vec<Item>>,
    ) -> Result<BatchWriteItemOutput> {
        debug!(tables = request_items.len(), "DynamoDB BatchWriteItem");

        self.client
            .batch_write_item()
            .set_request_items(Some(format_batch_write(request_items)?))
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "BatchWriteItem"))
    }

    /// Fetch many items by key across one or more tables.
    ///
    /// Returns the items per table; tables without a response have no entry.
    pub async fn batch_get_items(
        &self,
        request_keys: &HashMap<String, Vec<Item>>,
    ) -> Result<HashMap<String, Vec<Item>>> {
        debug!(tables = request_keys.len(), "DynamoDB BatchGetItem");

        let output = self
            .client
            .batch_get_item()
            .set_request_items(Some(format_batch_get(request_keys)?))
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "BatchGetItem"))?;

        output
            .responses
            .unwrap_or_default()
            .into_iter()
            .map(|(table, items)| {
                let items = items.into_iter().map(unmarshall).collect::<Result<Vec<_>>>()?;
                Ok::<_, AwsError>((table, items))
            })
            .collect()
    }
}

/// Build the `RequestItems` of a batch write: every item becomes a put request.
pub fn format_batch_write(
    request_items: &HashMap<String, Vec<Item>>,
) -> Result<HashMap<String, Vec<WriteRequest>>> {
    request_items
        .iter()
        .map(|(table, items)| {
            let requests = items
                .iter()
                .map(|item| {
                    let put = PutRequest::builder()
                        .set_item(Some(marshall(item)))
                        .build()
                        .map_err(AwsError::invalid_request)?;
                    Ok::<_, AwsError>(WriteRequest::builder().put_request(put).build())
                })
                .collect::<Result<Vec<_>>>()?;
            Ok::<_, AwsError>((table.clone(), requests))
        })
        .collect()
}

/// Build the `RequestItems` of a batch get.
pub fn format_batch_get(
    request_keys: &HashMap<String, Vec<Item>>,
) -> Result<HashMap<String, KeysAndAttributes>> {
    request_keys
        .iter()
        .map(|(table, keys)| {
            let keys = KeysAndAttributes::builder()
                .set_keys(Some(keys.iter().map(marshall).collect()))
                .build()
                .map_err(AwsError::invalid_request)?;
            Ok::<_, AwsError>((table.clone(), keys))
        })
        .collect()
}

// DynamoDB rejects an empty ExpressionAttributeValues map.
fn non_empty(values: &Item) -> Option<WireItem> {
    (!values.is_empty()).then(|| marshall(values))
}
