pub mod ingest;
pub mod kinesis_handler;
pub mod normalizer;
pub mod row_cell;
pub mod timestamps;

pub use crate::domain::model::{OutputRecord, RawRecord, RowMutation, Timestamp};
pub use crate::domain::ports::{RecordSink, RecordSource, RowCellSink};
pub use crate::utils::error::Result;
