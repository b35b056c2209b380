// Run persistence: structured JSON and flattened CSV from the same run,
// plus the cross-database comparative report.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{BenchmarkRun, Extra, HostInfo, OperationResult, ResourceSummary};

const TABULAR_HEADER: &str =
    "operation_name,duration_seconds,cpu_avg,cpu_max,mem_avg_bytes,mem_max_bytes,sample_count,extra";

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
    #[error("benchmark run is not finalized")]
    NotFinalized,
    #[error("malformed tabular report: {0}")]
    Malformed(String),
}

#[derive(Debug)]
pub struct RunReportPaths {
    pub json: PathBuf,
    pub csv: PathBuf,
}

#[derive(Debug)]
pub struct SuiteReportPaths {
    pub json: PathBuf,
    pub csv: PathBuf,
}

/// Combined report across every run of one invocation.
#[derive(Debug, Serialize, Deserialize)]
pub struct SuiteReport {
    pub generated_at: DateTime<Utc>,
    pub host: HostInfo,
    pub runs: Vec<BenchmarkRun>,
}

/// Writes reports under one output directory, created eagerly.
#[derive(Debug, Clone)]
pub struct ReportSink {
    output_dir: PathBuf,
}

impl ReportSink {
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self, ReportError> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    /// Persist one finalized run as `<db>_<dataset>_<ts>.json` and `.csv`.
    /// Both files are derived from the same immutable run.
    pub fn save_run(&self, run: &BenchmarkRun) -> Result<RunReportPaths, ReportError> {
        let finished = run.finished_at.ok_or(ReportError::NotFinalized)?;
        let stem = format!(
            "{}_{}_{}",
            sanitize(&run.database_name),
            sanitize(&run.dataset_name),
            finished.format("%Y%m%d_%H%M%S")
        );

        let json = self.output_dir.join(format!("{stem}.json"));
        let writer = BufWriter::new(File::create(&json)?);
        serde_json::to_writer_pretty(writer, run)?;

        let csv = self.output_dir.join(format!("{stem}.csv"));
        fs::write(&csv, render_tabular(run)?)?;

        tracing::info!(json = %json.display(), csv = %csv.display(), "run reports written");
        Ok(RunReportPaths { json, csv })
    }

    pub fn load_run(path: impl AsRef<Path>) -> Result<BenchmarkRun, ReportError> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }

    /// Comparative CSV plus combined JSON across every collected run.
    pub fn save_suite(
        &self,
        runs: &[BenchmarkRun],
        host: &HostInfo,
    ) -> Result<SuiteReportPaths, ReportError> {
        let generated_at = Utc::now();
        let ts = generated_at.format("%Y%m%d_%H%M%S");

        let json = self.output_dir.join(format!("all_runs_{ts}.json"));
        let writer = BufWriter::new(File::create(&json)?);
        let suite = SuiteReport {
            generated_at,
            host: host.clone(),
            runs: runs.to_vec(),
        };
        serde_json::to_writer_pretty(writer, &suite)?;

        let csv = self.output_dir.join(format!("comparative_{ts}.csv"));
        fs::write(&csv, render_comparative(runs))?;

        Ok(SuiteReportPaths { json, csv })
    }
}

/// Flatten a run: one row per OperationResult, resource summary flattened
/// into columns, extra counters as a JSON-encoded cell.
pub fn render_tabular(run: &BenchmarkRun) -> Result<String, ReportError> {
    let mut out = String::from(TABULAR_HEADER);
    out.push('\n');
    for r in &run.results {
        let extra = serde_json::to_string(&r.extra)?;
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{}\n",
            escape_csv(&r.operation_name),
            r.duration_seconds,
            r.resource_summary.cpu_avg,
            r.resource_summary.cpu_max,
            r.resource_summary.mem_avg_bytes,
            r.resource_summary.mem_max_bytes,
            r.resource_summary.sample_count,
            escape_csv(&extra),
        ));
    }
    Ok(out)
}

/// Parse a tabular report back into operation results.
pub fn parse_tabular(text: &str) -> Result<Vec<OperationResult>, ReportError> {
    let mut lines = text.lines();
    match lines.next() {
        Some(header) if header == TABULAR_HEADER => {}
        other => {
            return Err(ReportError::Malformed(format!(
                "unexpected header: {other:?}"
            )));
        }
    }
    let mut results = Vec::new();
    for (idx, line) in lines.enumerate() {
        if line.is_empty() {
            continue;
        }
        let row = idx + 1;
        let fields = split_csv_line(line);
        if fields.len() != 8 {
            return Err(ReportError::Malformed(format!(
                "row {row}: expected 8 fields, got {}",
                fields.len()
            )));
        }
        let extra: Extra = serde_json::from_str(&fields[7])?;
        results.push(OperationResult {
            operation_name: fields[0].clone(),
            duration_seconds: field(row, "duration_seconds", &fields[1])?,
            resource_summary: ResourceSummary {
                cpu_avg: field(row, "cpu_avg", &fields[2])?,
                cpu_max: field(row, "cpu_max", &fields[3])?,
                mem_avg_bytes: field(row, "mem_avg_bytes", &fields[4])?,
                mem_max_bytes: field(row, "mem_max_bytes", &fields[5])?,
                sample_count: field(row, "sample_count", &fields[6])?,
            },
            extra,
        });
    }
    Ok(results)
}

/// One row per operation name; duration/cpu-avg/mem-avg column group per
/// database; N/A where a database has no result for that operation.
pub fn render_comparative(runs: &[BenchmarkRun]) -> String {
    use std::collections::{BTreeMap, BTreeSet};

    let mut databases: BTreeMap<&str, BTreeMap<&str, &OperationResult>> = BTreeMap::new();
    let mut operations: BTreeSet<&str> = BTreeSet::new();
    for run in runs {
        let per_db = databases.entry(run.database_name.as_str()).or_default();
        for r in &run.results {
            operations.insert(r.operation_name.as_str());
            per_db.insert(r.operation_name.as_str(), r);
        }
    }

    let mut out = String::from("operation");
    for db in databases.keys() {
        out.push_str(&format!(",{db}_duration_s,{db}_cpu_avg,{db}_mem_avg_bytes"));
    }
    out.push('\n');
    for op in &operations {
        out.push_str(&escape_csv(op));
        for per_db in databases.values() {
            match per_db.get(op) {
                Some(r) => out.push_str(&format!(
                    ",{},{},{}",
                    r.duration_seconds, r.resource_summary.cpu_avg, r.resource_summary.mem_avg_bytes
                )),
                None => out.push_str(",N/A,N/A,N/A"),
            }
        }
        out.push('\n');
    }
    out
}

fn field<T: std::str::FromStr>(row: usize, name: &str, value: &str) -> Result<T, ReportError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| ReportError::Malformed(format!("row {row}, {name}: {e}")))
}

fn sanitize(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

fn escape_csv(value: &str) -> String {
    if value.contains(['"', ',', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => fields.push(std::mem::take(&mut current)),
                _ => current.push(c),
            }
        }
    }
    fields.push(current);
    fields
}
