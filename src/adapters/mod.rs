// Adapters layer: concrete sources and sinks for external systems.

pub mod jsonl;
pub mod thingspeak;

#[cfg(feature = "aws")]
pub mod dynamodb;
#[cfg(feature = "aws")]
pub mod kinesis;

#[cfg(feature = "kafka")]
pub mod kafka;
