use crate::domain::model::OutputRecord;
use crate::domain::ports::RecordSink;
use crate::utils::error::{IngestError, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_kinesis::config::Region;
use aws_sdk_kinesis::error::DisplayErrorContext;
use aws_sdk_kinesis::primitives::Blob;
use aws_sdk_kinesis::Client as KinesisClient;

#[derive(Debug, Clone)]
pub struct KinesisSink {
    client: KinesisClient,
    stream_name: String,
}

impl KinesisSink {
    pub fn new(client: KinesisClient, stream_name: String) -> Self {
        Self {
            client,
            stream_name,
        }
    }

    /// Builds a client from the default credential chain for `region`.
    pub async fn connect(stream_name: String, region: String) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region))
            .load()
            .await;
        Self::new(KinesisClient::new(&config), stream_name)
    }
}

#[async_trait]
impl RecordSink for KinesisSink {
    fn name(&self) -> &str {
        "kinesis"
    }

    async fn write(&self, record: &OutputRecord, partition_key: &str) -> Result<()> {
        let output = self
            .client
            .put_record()
            .stream_name(&self.stream_name)
            .partition_key(partition_key)
            .data(Blob::new(record.to_json_bytes()?))
            .send()
            .await
            .map_err(|e| IngestError::sink("kinesis", DisplayErrorContext(&e).to_string()))?;

        tracing::debug!(
            "Kinesis accepted record on shard {} (sequence {})",
            output.shard_id(),
            output.sequence_number()
        );
        Ok(())
    }
}
