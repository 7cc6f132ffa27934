pub mod lambda;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::adapters::thingspeak::DEFAULT_FEED_URL;
#[cfg(feature = "cli")]
use crate::core::normalizer::PassthroughMode;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};
#[cfg(feature = "cli")]
use toml_config::{MapPreset, MAX_RESULTS};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "iot-ingest")]
#[command(about = "ThingSpeak sensor ingestion for the Kinesis and Kafka pipelines")]
pub struct CliConfig {
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Poll ThingSpeak and push raw entries, stamped with `ec2_timestamp`, to Kinesis
    AwsIngest(AwsIngestArgs),
    /// Poll ThingSpeak and produce relabelled entries, stamped with `kafka_time`, to Kafka
    GcpIngest(GcpIngestArgs),
    /// Run an ingestion pipeline described by a TOML file
    Run(RunArgs),
    /// Turn JSON-lines messages into single-cell row writes
    Process(ProcessArgs),
    /// Normalize records from a file and print them as JSON lines
    Normalize(NormalizeArgs),
    /// Print the cost/latency comparison of both pipelines
    Compare(CompareArgs),
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct PollArgs {
    #[arg(long, default_value = DEFAULT_FEED_URL)]
    pub feed_url: String,

    /// Entries requested per poll
    #[arg(long)]
    pub results: Option<usize>,

    /// Stop after this many polls
    #[arg(long)]
    pub cycles: Option<usize>,

    /// Write JSON lines to this file instead of the cloud sink
    #[arg(long)]
    pub output: Option<String>,
}

#[cfg(feature = "cli")]
impl PollArgs {
    fn validate_with(&self, default_results: usize) -> Result<()> {
        validation::validate_url("feed_url", &self.feed_url)?;
        validation::validate_range(
            "results",
            self.results.unwrap_or(default_results),
            1,
            MAX_RESULTS,
        )?;
        if let Some(cycles) = self.cycles {
            validation::validate_positive_number("cycles", cycles, 1)?;
        }
        if let Some(output) = &self.output {
            validation::validate_path("output", output)?;
        }
        Ok(())
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct AwsIngestArgs {
    #[command(flatten)]
    pub poll: PollArgs,

    /// Seconds between polls
    #[arg(long, default_value = "60")]
    pub interval_secs: u64,

    #[arg(long, default_value = "data-ingestion-kinesis")]
    pub stream_name: String,

    #[arg(long, default_value = "us-east-1")]
    pub region: String,
}

#[cfg(feature = "cli")]
impl AwsIngestArgs {
    pub const DEFAULT_RESULTS: usize = 100;
}

#[cfg(feature = "cli")]
impl Validate for AwsIngestArgs {
    fn validate(&self) -> Result<()> {
        self.poll.validate_with(Self::DEFAULT_RESULTS)?;
        validation::validate_non_empty_string("stream_name", &self.stream_name)?;
        lambda::validate_aws_region("region", &self.region)
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct GcpIngestArgs {
    #[command(flatten)]
    pub poll: PollArgs,

    /// Seconds to pause between messages
    #[arg(long, default_value = "5.0")]
    pub delay: f64,

    /// Seconds between polls
    #[arg(long, default_value = "0")]
    pub interval_secs: u64,

    #[arg(short = 't', long, default_value = "iot-data")]
    pub topic: String,

    #[arg(short = 'b', long, default_value = "localhost:9092")]
    pub bootstrap_servers: String,

    #[arg(long)]
    pub security_protocol: Option<String>,

    #[arg(long)]
    pub sasl_mechanism: Option<String>,
}

#[cfg(feature = "cli")]
impl GcpIngestArgs {
    pub const DEFAULT_RESULTS: usize = 2;
}

#[cfg(feature = "cli")]
impl Validate for GcpIngestArgs {
    fn validate(&self) -> Result<()> {
        self.poll.validate_with(Self::DEFAULT_RESULTS)?;
        validation::validate_range("delay", self.delay, 0.0, 3600.0)?;
        validation::validate_non_empty_string("topic", &self.topic)?;
        validation::validate_non_empty_string("bootstrap_servers", &self.bootstrap_servers)
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Path to TOML pipeline file
    #[arg(short, long, default_value = "pipeline.toml")]
    pub config: String,

    #[arg(long)]
    pub cycles: Option<usize>,

    /// Fetch and normalize once, print the records, write nothing
    #[arg(long)]
    pub dry_run: bool,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct ProcessArgs {
    /// JSON-lines file, one message per line
    #[arg(long)]
    pub input: String,

    /// JSON-lines file receiving the row writes
    #[arg(long, default_value = "./output/rows.jsonl")]
    pub output: String,
}

#[cfg(feature = "cli")]
impl Validate for ProcessArgs {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input", &self.input)?;
        validation::validate_path("output", &self.output)
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct NormalizeArgs {
    /// JSON array or JSON-lines file of raw records
    #[arg(long)]
    pub input: String,

    #[arg(long, value_enum, default_value = "snake-case")]
    pub map: MapPreset,

    #[arg(long, value_enum, default_value = "allowlist")]
    pub mode: PassthroughMode,

    /// Add a stamp with this name holding the current time
    #[arg(long)]
    pub stamp: Option<String>,
}

#[cfg(feature = "cli")]
impl Validate for NormalizeArgs {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input", &self.input)?;
        if let Some(stamp) = &self.stamp {
            validation::validate_non_empty_string("stamp", stamp)?;
        }
        Ok(())
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct CompareArgs {
    #[arg(long, default_value = "AWS_result.csv")]
    pub aws: String,

    #[arg(long, default_value = "GCP_result.csv")]
    pub gcp: String,

    /// GCP billing export
    #[arg(long, default_value = "billing.csv")]
    pub billing: String,

    /// Project whose costs are summed in the billing export
    #[arg(long, default_value = "cool-continuity-457614-b2")]
    pub project: String,
}

#[cfg(feature = "cli")]
impl Validate for CompareArgs {
    fn validate(&self) -> Result<()> {
        validation::validate_path("aws", &self.aws)?;
        validation::validate_path("gcp", &self.gcp)?;
        validation::validate_path("billing", &self.billing)?;
        validation::validate_non_empty_string("project", &self.project)
    }
}
