//! Cross-version comparison matrix of (action, metric) → value, rendered as CSV.
//!
//! ```text
//! ,,3.7 (FULL DB),3.5 (EMPTY DB),
//! Struts Maven Scan,Time (ms),61023,58411,
//! Struts Maven Scan,Max Memory (Mb),190,,
//! ```

use crate::counters::Counters;
use crate::error::BenchResult;
use crate::schema::{ComparisonReport, ReportRow, RunMeta};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Location of the CSV report, relative to the run's working directory.
pub const REPORT_PATH: &str = "target/performance-report.csv";

#[derive(Clone, Debug)]
struct Metric {
    name: String,
    by_version: HashMap<String, u64>,
}

/// A benchmarked operation and every value recorded for it across version runs.
#[derive(Clone, Debug)]
struct Action {
    name: String,
    metrics: Vec<Metric>,
}

impl Action {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            metrics: Vec::new(),
        }
    }

    fn record(&mut self, version: &str, metric: &str, value: u64) {
        let idx = match self.metrics.iter().position(|m| m.name == metric) {
            Some(idx) => idx,
            None => {
                self.metrics.push(Metric {
                    name: metric.to_string(),
                    by_version: HashMap::new(),
                });
                self.metrics.len() - 1
            }
        };
        self.metrics[idx]
            .by_version
            .insert(version.to_string(), value);
    }
}

#[derive(Clone, Debug, Default)]
pub struct Report {
    versions: Vec<String>,
    actions: Vec<Action>,
    current_version: Option<String>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column and makes it the target of subsequent `add` calls. Duplicate labels
    /// are kept as separate columns.
    pub fn set_current_version(&mut self, label: &str) -> &mut Self {
        self.versions.push(label.to_string());
        self.current_version = Some(label.to_string());
        self
    }

    pub fn current_version(&self) -> Option<&str> {
        self.current_version.as_deref()
    }

    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    /// Records every counter under the current version. A value already present for the
    /// same (action, metric, version) is overwritten.
    pub fn add(&mut self, action_name: &str, counters: &Counters) -> &mut Self {
        if counters.is_empty() {
            return self;
        }
        let version = self.current_version.clone().unwrap_or_default();
        let idx = match self.actions.iter().position(|a| a.name == action_name) {
            Some(idx) => idx,
            None => {
                self.actions.push(Action::new(action_name));
                self.actions.len() - 1
            }
        };
        let action = &mut self.actions[idx];
        for (metric, value) in counters.values() {
            action.record(&version, metric, value);
        }
        self
    }

    pub fn value(&self, action: &str, metric: &str, version: &str) -> Option<u64> {
        self.actions
            .iter()
            .find(|a| a.name == action)?
            .metrics
            .iter()
            .find(|m| m.name == metric)?
            .by_version
            .get(version)
            .copied()
    }

    /// Rows in action-then-metric encounter order, one value slot per version column.
    pub fn rows(&self) -> Vec<ReportRow> {
        self.actions
            .iter()
            .flat_map(|action| {
                action.metrics.iter().map(|metric| ReportRow {
                    action: action.name.clone(),
                    metric: metric.name.clone(),
                    values: self
                        .versions
                        .iter()
                        .map(|v| metric.by_version.get(v).copied())
                        .collect(),
                })
            })
            .collect()
    }

    pub fn render(&self) -> BenchResult<String> {
        let mut wtr = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        // Empty trailing field gives every line its trailing comma.
        let mut header = vec![String::new(), String::new()];
        header.extend(self.versions.iter().cloned());
        header.push(String::new());
        wtr.write_record(&header)?;

        for row in self.rows() {
            let mut record = vec![row.action, row.metric];
            record.extend(
                row.values
                    .iter()
                    .map(|v| v.map(|v| v.to_string()).unwrap_or_default()),
            );
            record.push(String::new());
            wtr.write_record(&record)?;
        }

        let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Writes the CSV to [`REPORT_PATH`] under `work_dir` and returns the file path.
    pub fn dump(&self, work_dir: &Path) -> BenchResult<PathBuf> {
        let csv = self.render()?;
        let path = work_dir.join(REPORT_PATH);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, csv)?;
        tracing::info!(path = %path.display(), "report exported");
        Ok(path)
    }

    pub fn snapshot(&self) -> ComparisonReport {
        ComparisonReport {
            run: RunMeta::current(),
            versions: self.versions.clone(),
            rows: self.rows(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn counters(pairs: &[(&str, u64)]) -> Counters {
        let mut c = Counters::new();
        for (name, value) in pairs {
            c.set(name, Some(*value));
        }
        c
    }

    #[test]
    fn test_header_lists_every_version_including_duplicates() {
        let mut report = Report::new();
        report
            .set_current_version("3.5 (EMPTY DB)")
            .set_current_version("3.6 (EMPTY DB)")
            .set_current_version("3.5 (EMPTY DB)");

        let csv = report.render().unwrap();
        assert_eq!(csv, ",,3.5 (EMPTY DB),3.6 (EMPTY DB),3.5 (EMPTY DB),\n");
    }

    #[test]
    fn test_rows_follow_action_then_metric_order() {
        let mut report = Report::new();
        report.set_current_version("A");
        report.add("Scan", &counters(&[("Time (ms)", 100), ("Max Memory (Mb)", 190)]));
        report.add("Start", &counters(&[("Time (ms)", 20_000)]));
        report.set_current_version("B");
        report.add("Start", &counters(&[("Time (ms)", 18_000)]));
        report.add("Scan", &counters(&[("Time (ms)", 90)]));

        let csv = report.render().unwrap();
        assert_eq!(
            csv,
            ",,A,B,\n\
             Scan,Time (ms),100,90,\n\
             Scan,Max Memory (Mb),190,,\n\
             Start,Time (ms),20000,18000,\n"
        );
    }

    #[test]
    fn test_same_version_overwrites() {
        let mut report = Report::new();
        report.set_current_version("A");
        report.add("Scan", &counters(&[("Time (ms)", 100)]));
        report.add("Scan", &counters(&[("Time (ms)", 300)]));

        assert_eq!(report.value("Scan", "Time (ms)", "A"), Some(300));
        assert_eq!(report.rows().len(), 1);
    }

    #[test]
    fn test_empty_counters_create_no_row() {
        let mut report = Report::new();
        report.set_current_version("A");
        report.add("Scan", &Counters::new());

        assert!(report.rows().is_empty());
        assert_eq!(report.render().unwrap(), ",,A,\n");
    }

    #[test]
    fn test_dump_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut report = Report::new();
        report.set_current_version("1.0 (EMPTY DB)");
        report.add("Bench", &counters(&[("time", 250), ("memory", 68)]));

        let path = report.dump(dir.path()).unwrap();
        let first = fs::read(&path).unwrap();
        let path2 = report.dump(dir.path()).unwrap();
        let second = fs::read(&path2).unwrap();

        assert_eq!(path, dir.path().join(REPORT_PATH));
        assert_eq!(path, path2);
        assert_eq!(first, second);
        assert_eq!(
            String::from_utf8(first).unwrap(),
            ",,1.0 (EMPTY DB),\nBench,time,250,\nBench,memory,68,\n"
        );
    }

    #[test]
    fn test_snapshot_matches_rows() {
        let mut report = Report::new();
        report.set_current_version("A").set_current_version("B");
        report.add("Stop", &counters(&[("Time (ms)", 1200)]));

        let snapshot = report.snapshot();
        assert_eq!(snapshot.versions, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(
            snapshot.rows,
            vec![ReportRow {
                action: "Stop".to_string(),
                metric: "Time (ms)".to_string(),
                values: vec![None, Some(1200)],
            }]
        );

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"schema_version\":1"));
    }
}
