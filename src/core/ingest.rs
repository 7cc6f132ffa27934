use crate::core::normalizer::{FieldMap, Normalizer, PassthroughMode};
use crate::core::timestamps::TimestampFormat;
use crate::domain::model::Timestamp;
use crate::domain::ports::{RecordSink, RecordSource};
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

/// How a sink write is keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionKey {
    /// The record's `entry_id`, or `"default"` when it has none.
    EntryId,
    /// `key-<uuid>`, fresh per record.
    RandomUuid,
}

impl PartitionKey {
    pub fn derive(self, raw: &Value) -> String {
        match self {
            PartitionKey::EntryId => match raw.get("entry_id") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => "default".to_string(),
                Some(other) => other.to_string(),
            },
            PartitionKey::RandomUuid => format!("key-{}", Uuid::new_v4()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Log the failed record and move on to the next one.
    LogAndContinue,
    /// Stop the batch at the first failure.
    Abort,
}

/// Name and format of the stamp recording when this process saw a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampSpec {
    pub name: String,
    pub format: TimestampFormat,
}

impl StampSpec {
    pub fn new(name: impl Into<String>, format: TimestampFormat) -> Self {
        Self {
            name: name.into(),
            format,
        }
    }

    pub fn now(&self) -> Timestamp {
        Timestamp::now(self.name.clone(), self.format)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub fetched: usize,
    pub written: usize,
    pub failed: usize,
}

impl IngestStats {
    fn absorb(&mut self, other: IngestStats) {
        self.fetched += other.fetched;
        self.written += other.written;
        self.failed += other.failed;
    }
}

/// Settings shared by both ingestion flavours.
#[derive(Debug, Clone)]
pub struct JobSettings {
    pub normalizer: Normalizer,
    pub stamp: StampSpec,
    pub partition: PartitionKey,
    pub policy: ErrorPolicy,
    pub record_delay: Duration,
}

impl JobSettings {
    /// Polling feed → Kinesis: keep the record as fetched, add `ec2_timestamp`.
    pub fn aws() -> Self {
        Self {
            normalizer: Normalizer::new(FieldMap::default(), PassthroughMode::Full),
            stamp: StampSpec::new("ec2_timestamp", TimestampFormat::IsoMicrosZ),
            partition: PartitionKey::EntryId,
            policy: ErrorPolicy::LogAndContinue,
            record_delay: Duration::ZERO,
        }
    }

    /// Polling feed → Kafka: relabel the sensor fields, add `kafka_time`.
    pub fn gcp(record_delay: Duration) -> Self {
        Self {
            normalizer: Normalizer::new(FieldMap::thingspeak_labels(), PassthroughMode::Full),
            stamp: StampSpec::new("kafka_time", TimestampFormat::IsoSecondsZ),
            partition: PartitionKey::RandomUuid,
            policy: ErrorPolicy::Abort,
            record_delay,
        }
    }
}

pub struct IngestJob<S: RecordSource, K: RecordSink> {
    source: S,
    sink: K,
    settings: JobSettings,
}

impl<S: RecordSource, K: RecordSink> IngestJob<S, K> {
    pub fn new(source: S, sink: K, settings: JobSettings) -> Self {
        Self {
            source,
            sink,
            settings,
        }
    }

    pub fn settings(&self) -> &JobSettings {
        &self.settings
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Fetches one batch and pushes every entry through the normalizer into the sink.
    pub async fn run_once(&self) -> Result<IngestStats> {
        let feeds = self.source.fetch().await?;
        let mut stats = IngestStats {
            fetched: feeds.len(),
            ..IngestStats::default()
        };

        if feeds.is_empty() {
            tracing::info!("No feeds to process.");
            return Ok(stats);
        }

        for (i, entry) in feeds.iter().enumerate() {
            if i > 0 && !self.settings.record_delay.is_zero() {
                tokio::time::sleep(self.settings.record_delay).await;
            }

            match self.push(entry).await {
                Ok(key) => {
                    stats.written += 1;
                    tracing::info!("✅ Pushed record to {} (key {})", self.sink.name(), key);
                }
                Err(e) => {
                    stats.failed += 1;
                    tracing::error!("❌ Error sending entry to {}: {}", self.sink.name(), e);
                    if self.settings.policy == ErrorPolicy::Abort {
                        return Err(e);
                    }
                }
            }
        }

        tracing::info!(
            "📊 Batch done: {} fetched, {} written, {} failed",
            stats.fetched,
            stats.written,
            stats.failed
        );
        Ok(stats)
    }

    async fn push(&self, entry: &Value) -> Result<String> {
        let key = self.settings.partition.derive(entry);
        let record = self
            .settings
            .normalizer
            .normalize(entry, &[self.settings.stamp.now()])?;
        self.sink.write(&record, &key).await?;
        Ok(key)
    }

    /// Polls every `interval`. `max_cycles = None` runs until the task is dropped.
    pub async fn run_forever(&self, interval: Duration, max_cycles: Option<usize>) -> Result<IngestStats> {
        let mut total = IngestStats::default();
        let mut cycle = 0usize;

        loop {
            cycle += 1;
            tracing::debug!("Starting ingestion cycle {}", cycle);

            match self.run_once().await {
                Ok(stats) => total.absorb(stats),
                Err(e) if self.settings.policy == ErrorPolicy::LogAndContinue => {
                    tracing::error!("❌ Ingestion cycle {} failed: {}", cycle, e);
                    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
                }
                Err(e) => return Err(e),
            }

            if max_cycles.is_some_and(|max| cycle >= max) {
                return Ok(total);
            }

            tokio::time::sleep(interval).await;
        }
    }
}
