//! DynamoDB `TableClient` implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::config::Credentials;
use aws_sdk_dynamodb::error::BuildError;
use aws_sdk_dynamodb::operation::describe_table::DescribeTableError;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue as DynamoValue, BillingMode, Delete, KeySchemaElement,
    KeyType, Put, ReturnValue, ScalarAttributeType, TransactWriteItem,
};
use aws_sdk_dynamodb::Client;

use postboard_core::storage::{
    Condition, Item, Key, StoreError, StoreResult, TableClient, TransactOutcome, WriteOp,
    COUNTER_ATTR,
};

use super::conversions::{
    dynamo_to_item, item_to_dynamo, key_to_dynamo, ConditionExpr, PK, SK,
};
use super::error::{
    map_create_table_error, map_delete_item_error, map_get_item_error, map_put_item_error,
    map_query_error, map_transact_write_error, map_update_item_error,
};

fn build_error(err: BuildError) -> StoreError {
    StoreError::Failed(format!("invalid request: {err}"))
}

/// Single DynamoDB table holding every entity.
pub struct DynamoDbTable {
    client: Client,
    table_name: String,
}

impl DynamoDbTable {
    /// Creates a table client with the given DynamoDB client and table name.
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Creates a table client for `region`.
    ///
    /// With a local `endpoint` (DynamoDB Local) static dummy credentials are
    /// used, since the local server does not check them.
    pub async fn connect(
        table_name: impl Into<String>,
        region: impl Into<String>,
        endpoint: Option<&str>,
    ) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.into()));

        if let Some(endpoint) = endpoint {
            loader = loader
                .endpoint_url(endpoint)
                .credentials_provider(Credentials::new("dummy", "dummy", None, None, "static"));
        }

        let sdk_config = loader.load().await;
        Self::new(Client::new(&sdk_config), table_name)
    }

    /// Get the table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Creates the table if it does not exist yet.
    ///
    /// Returns `true` when the table was created.
    pub async fn ensure_table(&self) -> StoreResult<bool> {
        match self
            .client
            .describe_table()
            .table_name(&self.table_name)
            .send()
            .await
        {
            Ok(_) => return Ok(false),
            Err(err) => match err.into_service_error() {
                DescribeTableError::ResourceNotFoundException(_) => {}
                err => {
                    return Err(StoreError::Unavailable(format!(
                        "DescribeTable failed: {err}"
                    )))
                }
            },
        }

        let key_schema = vec![
            KeySchemaElement::builder()
                .attribute_name(PK)
                .key_type(KeyType::Hash)
                .build()
                .map_err(build_error)?,
            KeySchemaElement::builder()
                .attribute_name(SK)
                .key_type(KeyType::Range)
                .build()
                .map_err(build_error)?,
        ];
        let attribute_definitions = vec![
            AttributeDefinition::builder()
                .attribute_name(PK)
                .attribute_type(ScalarAttributeType::S)
                .build()
                .map_err(build_error)?,
            AttributeDefinition::builder()
                .attribute_name(SK)
                .attribute_type(ScalarAttributeType::S)
                .build()
                .map_err(build_error)?,
        ];

        self.client
            .create_table()
            .table_name(&self.table_name)
            .set_key_schema(Some(key_schema))
            .set_attribute_definitions(Some(attribute_definitions))
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await
            .map_err(map_create_table_error)?;

        tracing::info!(table = %self.table_name, "Created DynamoDB table");
        Ok(true)
    }

    fn transact_item(&self, op: &WriteOp) -> StoreResult<TransactWriteItem> {
        let item = match op {
            WriteOp::PutIfAbsent(item) => {
                let condition = ConditionExpr::absent();
                TransactWriteItem::builder().put(
                    Put::builder()
                        .table_name(&self.table_name)
                        .set_item(Some(item_to_dynamo(item)))
                        .condition_expression(condition.expression)
                        .build()
                        .map_err(build_error)?,
                )
            }
            WriteOp::PutIfVersion { item, expected } => {
                let condition = ConditionExpr::version(*expected);
                TransactWriteItem::builder().put(
                    Put::builder()
                        .table_name(&self.table_name)
                        .set_item(Some(item_to_dynamo(item)))
                        .condition_expression(condition.expression)
                        .set_expression_attribute_names(condition.names)
                        .set_expression_attribute_values(condition.values)
                        .build()
                        .map_err(build_error)?,
                )
            }
            WriteOp::DeleteIf { key, condition } => {
                let condition = ConditionExpr::from_condition(condition);
                TransactWriteItem::builder().delete(
                    Delete::builder()
                        .table_name(&self.table_name)
                        .set_key(Some(key_to_dynamo(key)))
                        .condition_expression(condition.expression)
                        .set_expression_attribute_names(condition.names)
                        .set_expression_attribute_values(condition.values)
                        .build()
                        .map_err(build_error)?,
                )
            }
        };
        Ok(item.build())
    }
}

#[async_trait]
impl TableClient for DynamoDbTable {
    async fn get(&self, key: &Key) -> StoreResult<Option<Item>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(key_to_dynamo(key)))
            .consistent_read(true)
            .send()
            .await
            .map_err(map_get_item_error)?;

        match result.item {
            Some(item) => Ok(Some(dynamo_to_item(&item)?)),
            None => Ok(None),
        }
    }

    async fn query(&self, pk: &str, sk_prefix: &str) -> StoreResult<Vec<Item>> {
        let mut items = Vec::new();
        let mut start_key: Option<HashMap<String, DynamoValue>> = None;

        loop {
            let mut request = self
                .client
                .query()
                .table_name(&self.table_name)
                .consistent_read(true)
                .expression_attribute_values(":pk", DynamoValue::S(pk.to_string()))
                .set_exclusive_start_key(start_key.take());

            request = if sk_prefix.is_empty() {
                request.key_condition_expression("PK = :pk")
            } else {
                request
                    .key_condition_expression("PK = :pk AND begins_with(SK, :prefix)")
                    .expression_attribute_values(":prefix", DynamoValue::S(sk_prefix.to_string()))
            };

            let page = request.send().await.map_err(map_query_error)?;
            for item in page.items() {
                items.push(dynamo_to_item(item)?);
            }

            match page.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        tracing::trace!(pk, sk_prefix, count = items.len(), "Queried partition");
        Ok(items)
    }

    async fn put_if_absent(&self, item: &Item) -> StoreResult<bool> {
        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item_to_dynamo(item)))
            .condition_expression(ConditionExpr::absent().expression)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) => map_put_item_error(err),
        }
    }

    async fn put_if_version(&self, item: &Item, expected: u64) -> StoreResult<bool> {
        let condition = ConditionExpr::version(expected);
        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item_to_dynamo(item)))
            .condition_expression(condition.expression)
            .set_expression_attribute_names(condition.names)
            .set_expression_attribute_values(condition.values)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) => map_put_item_error(err),
        }
    }

    async fn delete_if(&self, key: &Key, condition: &Condition) -> StoreResult<bool> {
        let condition = ConditionExpr::from_condition(condition);
        let result = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(key_to_dynamo(key)))
            .condition_expression(condition.expression)
            .set_expression_attribute_names(condition.names)
            .set_expression_attribute_values(condition.values)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) => map_delete_item_error(err),
        }
    }

    async fn increment(&self, key: &Key) -> StoreResult<u64> {
        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(key_to_dynamo(key)))
            .update_expression("ADD #counter :one")
            .expression_attribute_names("#counter", COUNTER_ATTR)
            .expression_attribute_values(":one", DynamoValue::N("1".to_string()))
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await
            .map_err(map_update_item_error)?;

        result
            .attributes()
            .and_then(|attrs| attrs.get(COUNTER_ATTR))
            .and_then(|value| value.as_n().ok())
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| StoreError::Malformed(format!("counter {} has no value", key.pk)))
    }

    fn supports_transactions(&self) -> bool {
        true
    }

    async fn transact_write(&self, ops: &[WriteOp]) -> StoreResult<TransactOutcome> {
        let items = ops
            .iter()
            .map(|op| self.transact_item(op))
            .collect::<StoreResult<Vec<_>>>()?;

        let result = self
            .client
            .transact_write_items()
            .set_transact_items(Some(items))
            .client_request_token(uuid::Uuid::new_v4().to_string())
            .send()
            .await;

        match result {
            Ok(_) => Ok(TransactOutcome::Committed),
            Err(err) => map_transact_write_error(err),
        }
    }
}
