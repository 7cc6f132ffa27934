use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A source-format record before field renaming.
pub type RawRecord = Map<String, Value>;

/// The renamed, timestamp-enriched record handed to a sink.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputRecord {
    fields: Map<String, Value>,
}

impl OutputRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.fields)?)
    }

    pub(crate) fn insert(&mut self, key: String, value: Value) {
        self.fields.insert(key, value);
    }
}

impl From<OutputRecord> for Value {
    fn from(record: OutputRecord) -> Self {
        record.into_value()
    }
}

/// A named enrichment stamp, e.g. `("kafka_time", "2024-01-01T00:00:00Z")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp {
    pub name: String,
    pub value: String,
}

impl Timestamp {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One cell write against a wide-column table: a single opaque value under one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowMutation {
    pub row_key: Vec<u8>,
    pub column_family: String,
    pub qualifier: Vec<u8>,
    pub value: Vec<u8>,
    pub timestamp_micros: i64,
}
