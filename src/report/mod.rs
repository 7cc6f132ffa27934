//! Text comparison of the two pipelines' load-test results and billing export.
//!
//! Result files carry one row per load level:
//! `load,p95_latency_ms,lambda_concurrency|dataflow_workers,cost_low,cost_med,cost_high`.

use crate::utils::error::{IngestError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Read;
use std::path::Path;

pub const HORIZON_SAMPLES: usize = 24;
pub const TOP_COST_DRIVERS: usize = 12;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResultRow {
    /// Events per minute.
    pub load: f64,
    pub p95_latency_ms: f64,
    #[serde(default)]
    pub lambda_concurrency: Option<f64>,
    #[serde(default)]
    pub dataflow_workers: Option<f64>,
    #[serde(default)]
    pub cost_low: Option<f64>,
    #[serde(default)]
    pub cost_med: Option<f64>,
    #[serde(default)]
    pub cost_high: Option<f64>,
}

pub fn read_results<R: Read>(reader: R) -> Result<Vec<ResultRow>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

pub fn load_results<P: AsRef<Path>>(path: P) -> Result<Vec<ResultRow>> {
    let file = std::fs::File::open(path)?;
    read_results(file)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostLevels {
    pub low: f64,
    pub med: f64,
    pub high: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CostLine {
    pub service: &'static str,
    pub levels: CostLevels,
}

const AWS_SERVICES: [&str; 3] = ["Kinesis Shards (AWS)", "Lambda Exec (AWS)", "DynamoDB Writes (AWS)"];
const GCP_SERVICES: [&str; 3] = [
    "Pub/Sub Throughput (GCP)",
    "Dataflow Workers (GCP)",
    "Bigtable Writes (GCP)",
];

fn first_row_costs(rows: &[ResultRow], provider: &str) -> Result<CostLevels> {
    let first = rows.first().ok_or_else(|| IngestError::DecodeError {
        message: format!("{} result file has no rows", provider),
    })?;
    Ok(CostLevels {
        low: first.cost_low.unwrap_or(0.0),
        med: first.cost_med.unwrap_or(0.0),
        high: first.cost_high.unwrap_or(0.0),
    })
}

/// Per-service cost at each load level, alternating AWS and GCP counterparts.
/// The result files only carry one cost triple per provider, taken from the first row.
pub fn cost_table(aws: &[ResultRow], gcp: &[ResultRow]) -> Result<Vec<CostLine>> {
    let aws_costs = first_row_costs(aws, "AWS")?;
    let gcp_costs = first_row_costs(gcp, "GCP")?;

    Ok(AWS_SERVICES
        .iter()
        .zip(GCP_SERVICES.iter())
        .flat_map(|(a, g)| {
            [
                CostLine {
                    service: *a,
                    levels: aws_costs,
                },
                CostLine {
                    service: *g,
                    levels: gcp_costs,
                },
            ]
        })
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizonPoint {
    /// Minutes since midnight.
    pub minute: u32,
    pub lambda_concurrency: Option<f64>,
    pub dataflow_workers: Option<f64>,
}

/// Hourly provisioned resources over one day, from the first 24 samples of each file.
pub fn autoscale_horizon(aws: &[ResultRow], gcp: &[ResultRow]) -> Vec<HorizonPoint> {
    (0..HORIZON_SAMPLES)
        .map(|hour| HorizonPoint {
            minute: hour as u32 * 60,
            lambda_concurrency: aws.get(hour).and_then(|r| r.lambda_concurrency),
            dataflow_workers: gcp.get(hour).and_then(|r| r.dataflow_workers),
        })
        .collect()
}

pub fn peak(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    values.flatten().fold(None, |acc, v| match acc {
        Some(max) if max >= v => Some(max),
        _ => Some(v),
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EcoPoint {
    pub provider: &'static str,
    pub eco_score: f64,
    pub events_per_minute: u32,
}

pub const ECO_SCORES: [EcoPoint; 4] = [
    EcoPoint {
        provider: "GCP Iowa",
        eco_score: 0.85,
        events_per_minute: 46_000,
    },
    EcoPoint {
        provider: "AWS Oregon",
        eco_score: 0.70,
        events_per_minute: 45_000,
    },
    EcoPoint {
        provider: "AWS Virginia",
        eco_score: 0.60,
        events_per_minute: 48_000,
    },
    EcoPoint {
        provider: "GCP Singapore",
        eco_score: 0.40,
        events_per_minute: 42_000,
    },
];

/// Sums `Cost` per `Service Description` for one project, largest first.
/// Returns `None` when the export lacks one of those columns.
pub fn top_cost_drivers<R: Read>(reader: R, project: &str, limit: usize) -> Result<Option<Vec<(String, f64)>>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);

    let (Some(project_col), Some(service_col), Some(cost_col)) = (
        column("Project Id"),
        column("Service Description"),
        column("Cost"),
    ) else {
        return Ok(None);
    };

    let mut totals: HashMap<String, f64> = HashMap::new();
    for record in rdr.records() {
        let record = record?;
        if record.get(project_col).map(str::trim) != Some(project) {
            continue;
        }
        let service = record.get(service_col).unwrap_or_default().trim().to_string();
        let cost = record
            .get(cost_col)
            .map(|c| c.trim().replace(',', ""))
            .and_then(|c| c.parse::<f64>().ok());
        match cost {
            Some(cost) => *totals.entry(service).or_insert(0.0) += cost,
            None => tracing::warn!("Skipping billing line with unreadable cost for {}", service),
        }
    }

    let mut ranked: Vec<(String, f64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    Ok(Some(ranked))
}

#[derive(Debug, Clone)]
pub struct ComparisonReport {
    pub aws: Vec<ResultRow>,
    pub gcp: Vec<ResultRow>,
    pub costs: Vec<CostLine>,
    pub horizon: Vec<HorizonPoint>,
    pub billing_project: String,
    /// `None` when the billing export has unexpected columns.
    pub billing: Option<Vec<(String, f64)>>,
}

impl ComparisonReport {
    pub fn build<R: Read>(
        aws: Vec<ResultRow>,
        gcp: Vec<ResultRow>,
        billing: R,
        billing_project: &str,
    ) -> Result<Self> {
        let costs = cost_table(&aws, &gcp)?;
        let horizon = autoscale_horizon(&aws, &gcp);
        let billing = top_cost_drivers(billing, billing_project, TOP_COST_DRIVERS)?;
        Ok(Self {
            aws,
            gcp,
            costs,
            horizon,
            billing_project: billing_project.to_string(),
            billing,
        })
    }

    pub fn render(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "=== Load vs p95 latency ===");
        let _ = writeln!(out, "{:>12}  {:>12}  {:>12}", "events/min", "AWS (ms)", "GCP (ms)");
        for i in 0..self.aws.len().max(self.gcp.len()) {
            let load = self.aws.get(i).or_else(|| self.gcp.get(i)).map(|r| r.load);
            let _ = writeln!(
                out,
                "{:>12}  {:>12}  {:>12}",
                fmt_opt(load),
                fmt_opt(self.aws.get(i).map(|r| r.p95_latency_ms)),
                fmt_opt(self.gcp.get(i).map(|r| r.p95_latency_ms)),
            );
        }

        let _ = writeln!(out, "\n=== Cost by load level (USD/hour) ===");
        let _ = writeln!(out, "{:<26}  {:>8}  {:>8}  {:>8}", "service", "low", "medium", "high");
        for line in &self.costs {
            let _ = writeln!(
                out,
                "{:<26}  {:>8.4}  {:>8.4}  {:>8.4}",
                line.service, line.levels.low, line.levels.med, line.levels.high
            );
        }

        let _ = writeln!(out, "\n=== 24-hour auto-scaling horizon ===");
        let _ = writeln!(out, "{:>6}  {:>18}  {:>16}", "minute", "Lambda concurrency", "Dataflow workers");
        for point in &self.horizon {
            let _ = writeln!(
                out,
                "{:>6}  {:>18}  {:>16}",
                point.minute,
                fmt_opt(point.lambda_concurrency),
                fmt_opt(point.dataflow_workers)
            );
        }
        let _ = writeln!(
            out,
            "peak: Lambda {} / Dataflow {}",
            fmt_opt(peak(self.horizon.iter().map(|p| p.lambda_concurrency))),
            fmt_opt(peak(self.horizon.iter().map(|p| p.dataflow_workers)))
        );

        let _ = writeln!(out, "\n=== Sustainability vs speed ===");
        for point in ECO_SCORES {
            let _ = writeln!(
                out,
                "{:<14}  eco {:.2}  {:>6} events/min",
                point.provider, point.eco_score, point.events_per_minute
            );
        }

        match &self.billing {
            Some(drivers) => {
                let _ = writeln!(
                    out,
                    "\n=== Top GCP cost drivers for project {} ===",
                    self.billing_project
                );
                for (service, cost) in drivers {
                    let _ = writeln!(out, "{:<40}  {:>10.2}", service, cost);
                }
            }
            None => {
                let _ = writeln!(
                    out,
                    "\nBilling CSV column names differ; expected 'Project Id', 'Service Description' and 'Cost'."
                );
            }
        }

        out
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{}", v))
}

#[cfg(test)]
mod tests {
    use super::*;

    const AWS: &str = "load,p95_latency_ms,lambda_concurrency,cost_low,cost_med,cost_high\n\
                       1000,120,2,0.01,0.05,0.20\n\
                       5000,180,8,0.01,0.05,0.20\n";
    const GCP: &str = "load,p95_latency_ms,dataflow_workers,cost_low,cost_med,cost_high\n\
                       1000,150,1,0.02,0.06,0.25\n";

    #[test]
    fn test_read_results_with_optional_columns() {
        let aws = read_results(AWS.as_bytes()).unwrap();
        assert_eq!(aws.len(), 2);
        assert_eq!(aws[1].lambda_concurrency, Some(8.0));
        assert_eq!(aws[1].dataflow_workers, None);
    }

    #[test]
    fn test_cost_table_alternates_providers() {
        let aws = read_results(AWS.as_bytes()).unwrap();
        let gcp = read_results(GCP.as_bytes()).unwrap();
        let costs = cost_table(&aws, &gcp).unwrap();

        assert_eq!(costs.len(), 6);
        assert_eq!(costs[0].service, "Kinesis Shards (AWS)");
        assert_eq!(costs[1].service, "Pub/Sub Throughput (GCP)");
        assert_eq!(costs[1].levels.high, 0.25);
        assert!(cost_table(&[], &gcp).is_err());
    }

    #[test]
    fn test_horizon_pads_missing_samples() {
        let aws = read_results(AWS.as_bytes()).unwrap();
        let gcp = read_results(GCP.as_bytes()).unwrap();
        let horizon = autoscale_horizon(&aws, &gcp);

        assert_eq!(horizon.len(), 24);
        assert_eq!(horizon[1].minute, 60);
        assert_eq!(horizon[1].lambda_concurrency, Some(8.0));
        assert_eq!(horizon[1].dataflow_workers, None);
        assert_eq!(peak(horizon.iter().map(|p| p.lambda_concurrency)), Some(8.0));
    }

    #[test]
    fn test_top_cost_drivers_for_project() {
        let billing = "Project Id,Service Description,Cost\n\
                       p1,Dataflow,10.5\n\
                       p1,Bigtable,\"1,200.00\"\n\
                       p2,Dataflow,99\n\
                       p1,Dataflow,4.5\n";
        let drivers = top_cost_drivers(billing.as_bytes(), "p1", 12).unwrap().unwrap();
        assert_eq!(
            drivers,
            vec![("Bigtable".to_string(), 1200.0), ("Dataflow".to_string(), 15.0)]
        );
    }

    #[test]
    fn test_billing_with_other_columns_is_skipped() {
        let billing = "project,service,amount\np1,x,1\n";
        assert!(top_cost_drivers(billing.as_bytes(), "p1", 12).unwrap().is_none());
    }

    #[test]
    fn test_render_mentions_every_section() {
        let aws = read_results(AWS.as_bytes()).unwrap();
        let gcp = read_results(GCP.as_bytes()).unwrap();
        let report = ComparisonReport::build(aws, gcp, "a,b\n".as_bytes(), "p1").unwrap();
        let text = report.render();

        assert!(text.contains("Load vs p95 latency"));
        assert!(text.contains("DynamoDB Writes (AWS)"));
        assert!(text.contains("peak: Lambda 8 / Dataflow 1"));
        assert!(text.contains("GCP Iowa"));
        assert!(text.contains("Billing CSV column names differ"));
    }
}
