use crate::domain::model::{OutputRecord, RowMutation};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;

pub trait RecordSource: Send + Sync {
    /// Fetches one batch of undecoded feed entries. Entries are left as raw JSON
    /// values so malformed ones reach the normalizer instead of vanishing here.
    fn fetch(&self) -> impl std::future::Future<Output = Result<Vec<Value>>> + Send;
}

#[async_trait]
pub trait RecordSink: Send + Sync {
    fn name(&self) -> &str;
    async fn write(&self, record: &OutputRecord, partition_key: &str) -> Result<()>;
}

#[async_trait]
impl<T: RecordSink + ?Sized> RecordSink for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn write(&self, record: &OutputRecord, partition_key: &str) -> Result<()> {
        (**self).write(record, partition_key).await
    }
}

#[async_trait]
pub trait RowCellSink: Send + Sync {
    async fn write_row(&self, row: &RowMutation) -> Result<()>;
}
