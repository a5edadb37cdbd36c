//! Error taxonomy for plan construction, version runs and report output.
//!
//! A scraping miss is never an error: the `logs` functions return `None` and the metric
//! simply does not reach the report.

use thiserror::Error;

pub type BenchResult<T> = std::result::Result<T, BenchError>;

#[derive(Debug, Error)]
pub enum BenchError {
    /// Commas are the report's field separator.
    #[error("commas are not accepted in task name: {name}")]
    InvalidTaskName { name: String },

    /// Quotes and commas would be escaped in the report header.
    #[error("quotes and commas are not accepted in version: {version}")]
    InvalidVersion { version: String },

    #[error("task {name} must be replayed at least once")]
    InvalidReplay { name: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("command `{command}` failed with {status}:\n{output}")]
    Command {
        command: String,
        status: String,
        output: String,
    },

    #[error("server error: {0}")]
    Server(String),

    #[error("config error: {0}")]
    Config(String),

    /// A task that cannot produce a meaningful row without this metric.
    #[error("metric unavailable: {metric}")]
    MetricUnavailable { metric: String },
}
