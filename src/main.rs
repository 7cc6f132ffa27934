use chrono::Utc;
use clap::Parser;
use iot_ingest::adapters::jsonl::{parse_records, JsonLinesSink};
use iot_ingest::adapters::thingspeak::ThingSpeakSource;
use iot_ingest::config::toml_config::{PipelineFile, SinkKind, SinkSection};
use iot_ingest::config::{
    AwsIngestArgs, Command, CompareArgs, GcpIngestArgs, NormalizeArgs, ProcessArgs, RunArgs,
};
use iot_ingest::core::ingest::{IngestJob, JobSettings};
use iot_ingest::core::normalizer::normalize;
use iot_ingest::core::row_cell::process_message;
use iot_ingest::core::timestamps::TimestampFormat;
use iot_ingest::domain::ports::{RecordSink, RecordSource};
use iot_ingest::report::{load_results, ComparisonReport};
use iot_ingest::utils::error::ErrorSeverity;
use iot_ingest::utils::{logger, validation::Validate};
use iot_ingest::{CliConfig, IngestError, Result, Timestamp};
use std::time::Duration;

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("🚀 Starting iot-ingest");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = run(config.command).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::AwsIngest(args) => aws_ingest(args).await,
        Command::GcpIngest(args) => gcp_ingest(args).await,
        Command::Run(args) => run_pipeline_file(args).await,
        Command::Process(args) => process(args).await,
        Command::Normalize(args) => normalize_file(args),
        Command::Compare(args) => compare(args),
    }
}

async fn aws_ingest(args: AwsIngestArgs) -> Result<()> {
    args.validate()?;
    let results = args.poll.results.unwrap_or(AwsIngestArgs::DEFAULT_RESULTS);
    let source = ThingSpeakSource::new(&args.poll.feed_url, results)?;

    let sink: Box<dyn RecordSink> = match &args.poll.output {
        Some(path) => Box::new(JsonLinesSink::new(path)),
        None => kinesis_sink(&args.stream_name, &args.region).await?,
    };

    tracing::info!("Starting ThingSpeak to {} ingestion service...", sink.name());
    let job = IngestJob::new(source, sink, JobSettings::aws());
    let stats = job
        .run_forever(Duration::from_secs(args.interval_secs), args.poll.cycles)
        .await?;
    println!(
        "✅ Pushed {} of {} entries ({} failed)",
        stats.written, stats.fetched, stats.failed
    );
    Ok(())
}

async fn gcp_ingest(args: GcpIngestArgs) -> Result<()> {
    args.validate()?;
    let results = args.poll.results.unwrap_or(GcpIngestArgs::DEFAULT_RESULTS);
    let source = ThingSpeakSource::new(&args.poll.feed_url, results)?;

    let sink: Box<dyn RecordSink> = match &args.poll.output {
        Some(path) => Box::new(JsonLinesSink::new(path)),
        None => kafka_sink(
            &args.topic,
            &args.bootstrap_servers,
            args.security_protocol.clone(),
            args.sasl_mechanism.clone(),
        )?,
    };

    let delay = Duration::try_from_secs_f64(args.delay).map_err(|_| {
        IngestError::InvalidConfigValueError {
            field: "delay".to_string(),
            value: args.delay.to_string(),
            reason: "Delay must be a non-negative number of seconds".to_string(),
        }
    })?;
    let job = IngestJob::new(source, sink, JobSettings::gcp(delay));
    let stats = job
        .run_forever(Duration::from_secs(args.interval_secs), args.poll.cycles)
        .await?;
    println!(
        "✅ Successfully produced {} messages to topic '{}' with {} sec delay between each.",
        stats.written, args.topic, args.delay
    );
    Ok(())
}

async fn run_pipeline_file(args: RunArgs) -> Result<()> {
    tracing::info!("📁 Loading configuration from: {}", args.config);
    let config = PipelineFile::from_file(&args.config)?;
    config.validate()?;

    let settings = config.job_settings()?;
    let source = ThingSpeakSource::new(&config.source.url, config.results())?;

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No records will be written");
        for entry in source.fetch().await? {
            let record = settings.normalizer.normalize(&entry, &[settings.stamp.now()])?;
            println!("{}", serde_json::to_string(&record)?);
        }
        return Ok(());
    }

    let sink = sink_from_section(&config.sink).await?;
    tracing::info!(
        "Running pipeline '{}' into {}",
        config.pipeline.name,
        sink.name()
    );
    let job = IngestJob::new(source, sink, settings);
    let stats = job.run_forever(config.interval(), args.cycles).await?;
    println!(
        "✅ Pipeline '{}' wrote {} of {} entries ({} failed)",
        config.pipeline.name, stats.written, stats.fetched, stats.failed
    );
    Ok(())
}

async fn process(args: ProcessArgs) -> Result<()> {
    args.validate()?;
    let content = std::fs::read_to_string(&args.input)?;
    let sink = JsonLinesSink::new(&args.output);

    let (mut written, mut failed) = (0usize, 0usize);
    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        match process_message(line.as_bytes(), None, Utc::now(), &sink).await {
            Ok(_) => written += 1,
            Err(e) => {
                failed += 1;
                tracing::error!("Error processing message: {}", e);
            }
        }
    }

    println!(
        "✅ Wrote {} rows to {} ({} failed)",
        written,
        sink.path().display(),
        failed
    );
    Ok(())
}

fn normalize_file(args: NormalizeArgs) -> Result<()> {
    args.validate()?;
    let content = std::fs::read_to_string(&args.input)?;
    let field_map = args.map.field_map();
    let stamps: Vec<Timestamp> = args
        .stamp
        .iter()
        .map(|name| Timestamp::now(name.clone(), TimestampFormat::IsoMicrosZ))
        .collect();

    for raw in parse_records(&content)? {
        let record = normalize(&raw, &field_map, args.mode, &stamps)?;
        println!("{}", serde_json::to_string(&record)?);
    }
    Ok(())
}

fn compare(args: CompareArgs) -> Result<()> {
    args.validate()?;
    let aws = load_results(&args.aws)?;
    let gcp = load_results(&args.gcp)?;
    let billing = std::fs::File::open(&args.billing)?;

    tracing::debug!("Loaded {} AWS rows and {} GCP rows", aws.len(), gcp.len());
    let report = ComparisonReport::build(aws, gcp, billing, &args.project)?;
    print!("{}", report.render());
    Ok(())
}

async fn sink_from_section(section: &SinkSection) -> Result<Box<dyn RecordSink>> {
    match section.kind {
        SinkKind::Jsonl => {
            let path = section.path.clone().ok_or_else(|| IngestError::MissingConfigError {
                field: "sink.path".to_string(),
            })?;
            Ok(Box::new(JsonLinesSink::new(path)))
        }
        SinkKind::Kinesis => {
            let stream = section.stream_name.as_deref().unwrap_or_default();
            let region = section.region.as_deref().unwrap_or("us-east-1");
            kinesis_sink(stream, region).await
        }
        SinkKind::Kafka => kafka_sink(
            section.topic.as_deref().unwrap_or_default(),
            section.bootstrap_servers.as_deref().unwrap_or_default(),
            section.security_protocol.clone(),
            section.sasl_mechanism.clone(),
        ),
    }
}

#[cfg(feature = "aws")]
async fn kinesis_sink(stream_name: &str, region: &str) -> Result<Box<dyn RecordSink>> {
    use iot_ingest::adapters::kinesis::KinesisSink;
    Ok(Box::new(
        KinesisSink::connect(stream_name.to_string(), region.to_string()).await,
    ))
}

#[cfg(not(feature = "aws"))]
async fn kinesis_sink(_stream_name: &str, _region: &str) -> Result<Box<dyn RecordSink>> {
    Err(IngestError::ConfigError {
        message: "Kinesis output needs the `aws` feature; pass --output for a local file".to_string(),
    })
}

#[cfg(feature = "kafka")]
fn kafka_sink(
    topic: &str,
    bootstrap_servers: &str,
    security_protocol: Option<String>,
    sasl_mechanism: Option<String>,
) -> Result<Box<dyn RecordSink>> {
    use iot_ingest::adapters::kafka::{KafkaSettings, KafkaSink};
    let settings = KafkaSettings {
        bootstrap_servers: bootstrap_servers.to_string(),
        topic: topic.to_string(),
        security_protocol,
        sasl_mechanism,
    };
    Ok(Box::new(KafkaSink::new(&settings)?))
}

#[cfg(not(feature = "kafka"))]
fn kafka_sink(
    _topic: &str,
    _bootstrap_servers: &str,
    _security_protocol: Option<String>,
    _sasl_mechanism: Option<String>,
) -> Result<Box<dyn RecordSink>> {
    Err(IngestError::ConfigError {
        message: "Kafka output needs the `kafka` feature; pass --output for a local file".to_string(),
    })
}
