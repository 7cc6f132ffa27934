use crate::core::normalizer::{FieldMap, Normalizer, PassthroughMode};
use crate::core::timestamps::{from_epoch_seconds, TimestampFormat};
use crate::domain::model::{OutputRecord, Timestamp};
use crate::domain::ports::RecordSink;
use crate::utils::error::{IngestError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

pub const LAMBDA_TIMESTAMP: &str = "lambda_timestamp";
pub const KINESIS_TIMESTAMP: &str = "kinesis_timestamp";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KinesisEvent {
    #[serde(rename = "Records")]
    pub records: Vec<KinesisEventRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KinesisEventRecord {
    pub kinesis: KinesisRecordData,
    #[serde(rename = "eventID", default)]
    pub event_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KinesisRecordData {
    /// Base64 encoded payload.
    pub data: String,
    #[serde(default)]
    pub partition_key: Option<String>,
    #[serde(default)]
    pub sequence_number: Option<String>,
    /// Seconds since the epoch, with a fractional part.
    pub approximate_arrival_timestamp: Number,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl KinesisRecordData {
    /// Decodes the base64 payload into JSON, keeping decimals as their original text.
    pub fn decode_payload(&self) -> Result<Value> {
        let bytes = STANDARD
            .decode(self.data.trim())
            .map_err(|e| IngestError::DecodeError {
                message: format!("payload is not valid base64: {}", e),
            })?;
        let text = String::from_utf8(bytes).map_err(|e| IngestError::DecodeError {
            message: format!("payload is not valid UTF-8: {}", e),
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn arrival_time(&self) -> Result<DateTime<Utc>> {
        let seconds = self
            .approximate_arrival_timestamp
            .as_f64()
            .ok_or_else(|| IngestError::DecodeError {
                message: format!(
                    "approximateArrivalTimestamp is not a number: {}",
                    self.approximate_arrival_timestamp
                ),
            })?;
        from_epoch_seconds(seconds)
    }
}

/// Remaps stream records to the table schema and writes them one by one.
pub struct KinesisHandler<K: RecordSink> {
    normalizer: Normalizer,
    sink: K,
}

impl<K: RecordSink> KinesisHandler<K> {
    /// Snake-case column names, allow-list mode.
    pub fn new(sink: K) -> Self {
        Self::with_normalizer(
            Normalizer::new(FieldMap::thingspeak_snake_case(), PassthroughMode::Allowlist),
            sink,
        )
    }

    pub fn with_normalizer(normalizer: Normalizer, sink: K) -> Self {
        Self { normalizer, sink }
    }

    pub async fn handle(&self, event: &KinesisEvent) -> Result<HandlerResponse> {
        self.handle_with_clock(event, Utc::now).await
    }

    /// Processes every record in order. The first failure is logged and returned;
    /// records after it are left for the stream to redeliver.
    pub async fn handle_with_clock<F>(&self, event: &KinesisEvent, clock: F) -> Result<HandlerResponse>
    where
        F: Fn() -> DateTime<Utc> + Send + Sync,
    {
        for record in &event.records {
            match self.process(record, clock()).await {
                Ok(output) => {
                    let item = serde_json::Value::from(output);
                    tracing::info!("Successfully inserted: {}", item);
                }
                Err(e) => {
                    tracing::error!(
                        "Error processing record {}: {}",
                        record.kinesis.sequence_number.as_deref().unwrap_or("-"),
                        e
                    );
                    return Err(e);
                }
            }
        }

        Ok(HandlerResponse {
            status_code: 200,
            body: "Processed all records successfully.".to_string(),
        })
    }

    async fn process(&self, record: &KinesisEventRecord, now: DateTime<Utc>) -> Result<OutputRecord> {
        let payload = record.kinesis.decode_payload()?;
        let stamps = [
            Timestamp::at(LAMBDA_TIMESTAMP, now, TimestampFormat::IsoMicrosZ),
            Timestamp::at(
                KINESIS_TIMESTAMP,
                record.kinesis.arrival_time()?,
                TimestampFormat::IsoOffset,
            ),
        ];
        let output = self.normalizer.normalize(&payload, &stamps)?;

        let key = record.kinesis.partition_key.as_deref().unwrap_or("default");
        self.sink.write(&output, key).await?;
        Ok(output)
    }
}
