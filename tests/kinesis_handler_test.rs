use anyhow::Result;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{TimeZone, Utc};
use iot_ingest::adapters::jsonl::JsonLinesSink;
use iot_ingest::{IngestError, KinesisEvent, KinesisHandler};
use serde_json::{json, Value};
use tempfile::TempDir;

fn kinesis_event(payloads: &[&str]) -> Result<KinesisEvent> {
    let records: Vec<Value> = payloads
        .iter()
        .enumerate()
        .map(|(i, payload)| {
            json!({
                "kinesis": {
                    "kinesisSchemaVersion": "1.0",
                    "partitionKey": format!("{}", 100 + i),
                    "sequenceNumber": format!("4959033215623{}", i),
                    "data": STANDARD.encode(payload),
                    "approximateArrivalTimestamp": 1743501600.123
                },
                "eventSource": "aws:kinesis",
                "eventVersion": "1.0",
                "eventID": format!("shardId-000000000000:{}", i),
                "eventName": "aws:kinesis:record",
                "awsRegion": "us-east-1"
            })
        })
        .collect();

    Ok(serde_json::from_value(json!({ "Records": records }))?)
}

#[tokio::test]
async fn test_records_land_in_table_shape() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let sink = JsonLinesSink::new(temp_dir.path().join("table.jsonl"));
    let output_path = sink.path().to_path_buf();
    let handler = KinesisHandler::new(sink);

    let event = kinesis_event(&[
        r#"{"created_at":"2025-04-01T10:00:00Z","entry_id":101,"field1":"225","field2":"3.6","field4":"72.345678901234","ec2_timestamp":"2025-04-01T10:00:01.5Z"}"#,
        r#"{"entry_id":102,"field8":812,"field5":0.00}"#,
    ])?;

    let clock = || Utc.with_ymd_and_hms(2025, 4, 1, 10, 0, 2).unwrap();
    let response = handler.handle_with_clock(&event, clock).await?;
    assert_eq!(
        serde_json::to_value(&response)?,
        json!({"statusCode": 200, "body": "Processed all records successfully."})
    );

    let content = std::fs::read_to_string(output_path)?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[0],
        r#"{"wind_direction":"225","wind_speed":"3.6","temperature_fahrenheit":"72.345678901234","entry_id":101,"created_at":"2025-04-01T10:00:00Z","lambda_timestamp":"2025-04-01T10:00:02Z","kinesis_timestamp":"2025-04-01T10:00:00.123000+00:00"}"#
    );
    assert_eq!(
        lines[1],
        r#"{"rain_inches_per_minute":0.00,"light_intensity":812,"entry_id":102,"lambda_timestamp":"2025-04-01T10:00:02Z","kinesis_timestamp":"2025-04-01T10:00:00.123000+00:00"}"#
    );
    Ok(())
}

#[tokio::test]
async fn test_bad_record_stops_the_batch() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let sink = JsonLinesSink::new(temp_dir.path().join("table.jsonl"));
    let output_path = sink.path().to_path_buf();
    let handler = KinesisHandler::new(sink);

    let event = kinesis_event(&[r#"{"entry_id":1}"#, "{truncated", r#"{"entry_id":3}"#])?;
    let err = handler.handle(&event).await.unwrap_err();

    assert!(matches!(err, IngestError::SerializationError(_)));
    let content = std::fs::read_to_string(output_path)?;
    assert_eq!(content.lines().count(), 1);
    Ok(())
}
