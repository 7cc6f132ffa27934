use anyhow::Result;
use iot_ingest::report::{load_results, ComparisonReport};
use iot_ingest::IngestError;
use std::fs::File;
use tempfile::TempDir;

#[test]
fn test_report_from_result_files() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let aws_path = temp_dir.path().join("AWS_result.csv");
    let gcp_path = temp_dir.path().join("GCP_result.csv");
    let billing_path = temp_dir.path().join("billing.csv");

    std::fs::write(
        &aws_path,
        "load,p95_latency_ms,lambda_concurrency,cost_low,cost_med,cost_high\n\
         1000,110,3,0.02,0.09,0.31\n\
         10000,240,12,,,\n",
    )?;
    std::fs::write(
        &gcp_path,
        "load,p95_latency_ms,dataflow_workers,cost_low,cost_med,cost_high\n\
         1000,130,2,0.03,0.08,0.27\n\
         10000,200,5,,,\n",
    )?;
    std::fs::write(
        &billing_path,
        "Billing account name,Project Id,Service Description,Cost\n\
         acct,cool-continuity-457614-b2,Cloud Bigtable,12.40\n\
         acct,cool-continuity-457614-b2,Dataflow,30.10\n\
         acct,other-project,Dataflow,999\n",
    )?;

    let aws = load_results(&aws_path)?;
    let gcp = load_results(&gcp_path)?;
    assert_eq!(aws.len(), 2);
    assert_eq!(gcp[1].dataflow_workers, Some(5.0));

    let report = ComparisonReport::build(
        aws,
        gcp,
        File::open(&billing_path)?,
        "cool-continuity-457614-b2",
    )?;

    assert_eq!(report.costs.len(), 6);
    assert_eq!(report.costs[0].levels.high, 0.31);
    assert_eq!(
        report.billing,
        Some(vec![
            ("Dataflow".to_string(), 30.10),
            ("Cloud Bigtable".to_string(), 12.40)
        ])
    );

    let text = report.render();
    assert!(text.contains("Top GCP cost drivers for project cool-continuity-457614-b2"));
    assert!(text.contains("peak: Lambda 12 / Dataflow 5"));
    assert!(!text.contains("other-project"));
    Ok(())
}

#[test]
fn test_missing_result_file_is_io_error() {
    let err = load_results("/nonexistent/AWS_result.csv").unwrap_err();
    assert!(matches!(err, IngestError::IoError(_)));
}
