use crate::domain::model::{OutputRecord, RawRecord, Timestamp};
use crate::utils::error::{IngestError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Metadata keys carried over in [`PassthroughMode::Allowlist`] even though
/// they are not part of the rename table.
pub const METADATA_ALLOWLIST: [&str; 2] = ["entry_id", "created_at"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum PassthroughMode {
    /// Keep mapped fields and [`METADATA_ALLOWLIST`] only.
    Allowlist,
    /// Keep every field, renaming the mapped ones.
    Full,
}

/// Ordered rename table from source field identifiers to output names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldMap {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl FieldMap {
    pub fn new<I, K, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = FieldMap::default();
        for (source, target) in entries {
            let (source, target) = (source.into(), target.into());
            if source.is_empty() || target.is_empty() {
                return Err(IngestError::InvalidConfigValueError {
                    field: "field_map".to_string(),
                    value: format!("{:?} -> {:?}", source, target),
                    reason: "Source and output names must be non-empty".to_string(),
                });
            }
            // 重複的來源欄位以後者為準，但保留第一次出現的位置
            match map.index.get(&source) {
                Some(&pos) => map.entries[pos].1 = target,
                None => {
                    map.index.insert(source.clone(), map.entries.len());
                    map.entries.push((source, target));
                }
            }
        }
        Ok(map)
    }

    /// Maps every given key to itself.
    pub fn identity<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let mut map = FieldMap::default();
        for key in keys {
            let key = key.into();
            if key.is_empty() || map.index.contains_key(&key) {
                continue;
            }
            map.index.insert(key.clone(), map.entries.len());
            map.entries.push((key.clone(), key));
        }
        map
    }

    /// Snake-case names written to the DynamoDB table.
    pub fn thingspeak_snake_case() -> Self {
        Self::from_static(&[
            ("field1", "wind_direction"),
            ("field2", "wind_speed"),
            ("field3", "humidity_percent"),
            ("field4", "temperature_fahrenheit"),
            ("field5", "rain_inches_per_minute"),
            ("field6", "pressure_inhg"),
            ("field7", "power_level_volts"),
            ("field8", "light_intensity"),
        ])
    }

    /// Display labels used on the Kafka topic.
    pub fn thingspeak_labels() -> Self {
        Self::from_static(&[
            ("field1", "Wind Direction"),
            ("field2", "Wind Speed (mph)"),
            ("field3", "Humidity"),
            ("field4", "Temperature(F)"),
            ("field5", "Rain(Inches/minute)"),
            ("field6", "Pressure(\"Hg)"),
            ("field7", "Power Level (V)"),
            ("field8", "Light Intensity"),
        ])
    }

    fn from_static(pairs: &[(&str, &str)]) -> Self {
        let mut map = FieldMap::default();
        for (source, target) in pairs {
            map.index.insert(source.to_string(), map.entries.len());
            map.entries.push((source.to_string(), target.to_string()));
        }
        map
    }

    pub fn get(&self, source: &str) -> Option<&str> {
        self.index
            .get(source)
            .map(|&pos| self.entries[pos].1.as_str())
    }

    /// Position of `source` in declaration order.
    pub fn position(&self, source: &str) -> Option<usize> {
        self.index.get(source).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(s, t)| (s.as_str(), t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Rename table and passthrough policy, built once at startup and shared by reference.
#[derive(Debug, Clone)]
pub struct Normalizer {
    field_map: FieldMap,
    mode: PassthroughMode,
}

impl Normalizer {
    pub fn new(field_map: FieldMap, mode: PassthroughMode) -> Self {
        Self { field_map, mode }
    }

    pub fn field_map(&self) -> &FieldMap {
        &self.field_map
    }

    pub fn mode(&self) -> PassthroughMode {
        self.mode
    }

    pub fn normalize(&self, raw: &Value, timestamps: &[Timestamp]) -> Result<OutputRecord> {
        normalize(raw, &self.field_map, self.mode, timestamps)
    }
}

/// Renames the fields of `raw` and appends `timestamps`.
///
/// Two source keys landing on the same output name are resolved the same way
/// on every call: a renamed key beats a passed-through key, and among renamed
/// keys the one declared later in `field_map` wins. In allow-list mode the
/// metadata keys are copied after the renamed ones and overwrite them.
/// Timestamps are applied last and overwrite anything of the same name.
pub fn normalize(
    raw: &Value,
    field_map: &FieldMap,
    mode: PassthroughMode,
    timestamps: &[Timestamp],
) -> Result<OutputRecord> {
    let record = as_record(raw)?;

    let mut output = match mode {
        PassthroughMode::Allowlist => allowlist(record, field_map),
        PassthroughMode::Full => full(record, field_map),
    };

    for stamp in timestamps {
        output.insert(stamp.name.clone(), Value::String(stamp.value.clone()));
    }

    Ok(output)
}

fn as_record(raw: &Value) -> Result<&RawRecord> {
    match raw {
        Value::Object(map) => Ok(map),
        other => Err(IngestError::schema(format!(
            "expected a JSON object, got {}",
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn allowlist(record: &RawRecord, field_map: &FieldMap) -> OutputRecord {
    let mut output = OutputRecord::new();

    for (source, target) in field_map.iter() {
        if let Some(value) = record.get(source) {
            output.insert(target.to_string(), value.clone());
        }
    }

    // 中繼資料最後寫入，與改名欄位同名時以中繼資料為準
    for key in METADATA_ALLOWLIST {
        if let Some(value) = record.get(key) {
            output.insert(key.to_string(), value.clone());
        }
    }

    output
}

fn full(record: &RawRecord, field_map: &FieldMap) -> OutputRecord {
    let mut output = OutputRecord::new();
    // 0 代表原樣保留的欄位，改名欄位的優先序為宣告位置 + 1
    let mut rank: HashMap<&str, usize> = HashMap::with_capacity(record.len());

    for (key, value) in record {
        let (target, priority) = match field_map.position(key) {
            Some(pos) => (field_map.entries[pos].1.as_str(), pos + 1),
            None => (key.as_str(), 0),
        };

        let wins = rank.get(target).map_or(true, |&held| priority >= held);
        if wins {
            rank.insert(target, priority);
            output.insert(target.to_string(), value.clone());
        }
    }

    output
}
