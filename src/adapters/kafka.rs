use crate::domain::model::OutputRecord;
use crate::domain::ports::RecordSink;
use crate::utils::error::{IngestError, Result};
use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KafkaSettings {
    pub bootstrap_servers: String,
    pub topic: String,
    #[serde(default)]
    pub security_protocol: Option<String>,
    #[serde(default)]
    pub sasl_mechanism: Option<String>,
}

pub struct KafkaSink {
    producer: FutureProducer,
    topic: String,
}

impl KafkaSink {
    pub fn new(settings: &KafkaSettings) -> Result<Self> {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", &settings.bootstrap_servers)
            .set("acks", "all")
            .set("retries", "5")
            .set("linger.ms", "5");
        if let Some(protocol) = &settings.security_protocol {
            config.set("security.protocol", protocol);
        }
        if let Some(mechanism) = &settings.sasl_mechanism {
            config.set("sasl.mechanisms", mechanism);
        }

        let producer: FutureProducer = config.create().map_err(|e| IngestError::ConfigError {
            message: format!("Failed to create Kafka producer: {}", e),
        })?;

        Ok(Self {
            producer,
            topic: settings.topic.clone(),
        })
    }
}

#[async_trait]
impl RecordSink for KafkaSink {
    fn name(&self) -> &str {
        "kafka"
    }

    async fn write(&self, record: &OutputRecord, partition_key: &str) -> Result<()> {
        let payload = record.to_json_bytes()?;
        let message = FutureRecord::to(&self.topic)
            .key(partition_key)
            .payload(&payload);

        let (partition, offset) = self
            .producer
            .send(message, Timeout::After(Duration::from_secs(30)))
            .await
            .map_err(|(e, _)| IngestError::sink("kafka", format!("Msg delivery to Kafka failed: {}", e)))?;

        tracing::debug!(
            "Delivered message to {} [{}] at offset {}",
            self.topic,
            partition,
            offset
        );
        Ok(())
    }
}
