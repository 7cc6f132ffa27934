use crate::domain::model::{OutputRecord, RowMutation};
use crate::domain::ports::{RecordSink, RowCellSink};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Appends one JSON document per line to a local file.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append_line(&self, mut line: Vec<u8>) -> Result<()> {
        line.push(b'\n');
        let _guard = self.lock.lock().await;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Reads records from either a JSON array, a single JSON object, or JSON lines.
pub fn parse_records(content: &str) -> Result<Vec<Value>> {
    if let Ok(value) = serde_json::from_str::<Value>(content) {
        return Ok(match value {
            Value::Array(items) => items,
            other => vec![other],
        });
    }

    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_str::<Value>(line).map_err(Into::into))
        .collect()
}

#[async_trait]
impl RecordSink for JsonLinesSink {
    fn name(&self) -> &str {
        "jsonl"
    }

    async fn write(&self, record: &OutputRecord, _partition_key: &str) -> Result<()> {
        self.append_line(record.to_json_bytes()?).await
    }
}

#[async_trait]
impl RowCellSink for JsonLinesSink {
    async fn write_row(&self, row: &RowMutation) -> Result<()> {
        let hex: String = row.row_key.iter().map(|b| format!("{:02x}", b)).collect();
        let line = json!({
            "row_key": hex,
            "column": format!("{}:{}", row.column_family, String::from_utf8_lossy(&row.qualifier)),
            "value": String::from_utf8_lossy(&row.value),
            "timestamp_micros": row.timestamp_micros,
        });
        self.append_line(serde_json::to_vec(&line)?).await
    }
}
