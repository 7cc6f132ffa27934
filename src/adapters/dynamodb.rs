use crate::domain::model::OutputRecord;
use crate::domain::ports::RecordSink;
use crate::utils::error::{IngestError, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use serde_json::Value;
use std::collections::HashMap;

/// Converts a JSON value to a DynamoDB attribute. Numbers are sent as their
/// exact decimal text.
pub fn to_attribute_value(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(to_attribute_value).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), to_attribute_value(v)))
                .collect(),
        ),
    }
}

pub fn to_item(record: &OutputRecord) -> HashMap<String, AttributeValue> {
    record
        .iter()
        .map(|(k, v)| (k.clone(), to_attribute_value(v)))
        .collect()
}

#[derive(Debug, Clone)]
pub struct DynamoDbSink {
    client: DynamoClient,
    table_name: String,
}

impl DynamoDbSink {
    pub fn new(client: DynamoClient, table_name: String) -> Self {
        Self { client, table_name }
    }

    pub async fn connect(table_name: String, region: Option<String>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        let config = loader.load().await;
        Self::new(DynamoClient::new(&config), table_name)
    }
}

#[async_trait]
impl RecordSink for DynamoDbSink {
    fn name(&self) -> &str {
        "dynamodb"
    }

    async fn write(&self, record: &OutputRecord, _partition_key: &str) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(to_item(record)))
            .send()
            .await
            .map_err(|e| IngestError::sink("dynamodb", DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }
}
