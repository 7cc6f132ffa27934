use anyhow::Result;
use httpmock::prelude::*;
use iot_ingest::adapters::jsonl::JsonLinesSink;
use iot_ingest::adapters::thingspeak::ThingSpeakSource;
use iot_ingest::config::toml_config::PipelineFile;
use iot_ingest::utils::validation::Validate;
use iot_ingest::{IngestJob, IngestStats, JobSettings};
use serde_json::Value;
use std::time::Duration;
use tempfile::TempDir;

const FEED_BODY: &str = r#"{
  "channel": {"id": 12397, "name": "WeatherStation"},
  "feeds": [
    {"created_at": "2025-04-01T10:00:00Z", "entry_id": 101, "field1": "225", "field3": "55", "field4": "72.345678901234"},
    {"created_at": "2025-04-01T10:01:00Z", "entry_id": 102, "field1": "230", "field3": "54", "field4": 71.9000}
  ]
}"#;

fn mock_feed<'a>(server: &'a MockServer, results: &str) -> httpmock::Mock<'a> {
    server.mock(|when, then| {
        when.method(GET)
            .path("/channels/12397/feeds.json")
            .query_param("results", results);
        then.status(200)
            .header("Content-Type", "application/json")
            .body(FEED_BODY);
    })
}

fn read_lines(path: &std::path::Path) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path)?;
    content
        .lines()
        .map(|line| Ok(serde_json::from_str(line)?))
        .collect()
}

#[tokio::test]
async fn test_aws_ingest_end_to_end() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let api_mock = mock_feed(&server, "100");

    let source = ThingSpeakSource::new(&server.url("/channels/12397/feeds.json"), 100)?;
    let sink = JsonLinesSink::new(temp_dir.path().join("kinesis.jsonl"));
    let job = IngestJob::new(source, sink, JobSettings::aws());

    let stats = job.run_once().await?;
    api_mock.assert();
    assert_eq!(stats, IngestStats { fetched: 2, written: 2, failed: 0 });

    let lines = read_lines(job.sink().path())?;
    assert_eq!(lines.len(), 2);
    // Kinesis 端保留原始欄位名稱
    assert_eq!(lines[0]["field4"], "72.345678901234");
    assert_eq!(lines[1]["field4"].to_string(), "71.9000");
    assert!(lines[0]["ec2_timestamp"].as_str().unwrap().ends_with('Z'));
    Ok(())
}

#[tokio::test]
async fn test_gcp_ingest_end_to_end() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let api_mock = mock_feed(&server, "2");

    let source = ThingSpeakSource::new(&server.url("/channels/12397/feeds.json"), 2)?;
    let sink = JsonLinesSink::new(temp_dir.path().join("kafka.jsonl"));
    let job = IngestJob::new(source, sink, JobSettings::gcp(Duration::ZERO));

    let total = job.run_forever(Duration::from_millis(1), Some(2)).await?;
    api_mock.assert_hits(2);
    assert_eq!(total.written, 4);

    let lines = read_lines(job.sink().path())?;
    assert_eq!(lines[0]["Wind Direction"], "225");
    assert_eq!(lines[0]["Humidity"], "55");
    assert_eq!(lines[0]["entry_id"], 101);
    let kafka_time = lines[0]["kafka_time"].as_str().unwrap();
    assert_eq!(kafka_time.len(), "2025-04-01T10:00:00Z".len());
    Ok(())
}

#[tokio::test]
async fn test_source_outage_is_survived_by_aws_loop() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/feeds.json");
        then.status(503);
    });

    let source = ThingSpeakSource::new(&server.url("/feeds.json"), 100)?;
    let sink = JsonLinesSink::new(temp_dir.path().join("out.jsonl"));
    let job = IngestJob::new(source, sink, JobSettings::aws());

    let total = job.run_forever(Duration::from_millis(1), Some(2)).await?;
    api_mock.assert_hits(2);
    assert_eq!(total, IngestStats::default());
    Ok(())
}

#[tokio::test]
async fn test_pipeline_file_drives_job() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let api_mock = mock_feed(&server, "2");
    let output = temp_dir.path().join("pipeline.jsonl");

    let config_content = format!(
        r#"
[pipeline]
name = "snake-case-file"

[source]
url = "{}"
results = 2

[normalize]
mode = "allowlist"
preset = "snake_case"
stamp = {{ name = "fetched_at", format = "iso_micros_z" }}

[sink]
kind = "jsonl"
path = "{}"
"#,
        server.url("/channels/12397/feeds.json"),
        output.to_str().unwrap().replace('\\', "/")
    );
    let config_path = temp_dir.path().join("pipeline.toml");
    tokio::fs::write(&config_path, config_content).await?;

    let config = PipelineFile::from_file(&config_path)?;
    config.validate()?;

    let source = ThingSpeakSource::new(&config.source.url, config.results())?;
    let sink = JsonLinesSink::new(config.sink.path.clone().unwrap());
    let job = IngestJob::new(source, sink, config.job_settings()?);
    job.run_once().await?;
    api_mock.assert();

    let lines = read_lines(&output)?;
    let keys: Vec<&String> = lines[0].as_object().unwrap().keys().collect();
    assert_eq!(
        keys,
        vec![
            "wind_direction",
            "humidity_percent",
            "temperature_fahrenheit",
            "entry_id",
            "created_at",
            "fetched_at"
        ]
    );
    Ok(())
}
