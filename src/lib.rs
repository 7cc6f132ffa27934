pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod report;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::lambda::LambdaConfig;
pub use core::ingest::{IngestJob, IngestStats, JobSettings};
pub use core::kinesis_handler::{KinesisEvent, KinesisHandler};
pub use core::normalizer::{normalize, FieldMap, Normalizer, PassthroughMode};
pub use domain::model::{OutputRecord, RawRecord, Timestamp};
pub use utils::error::{IngestError, Result};
