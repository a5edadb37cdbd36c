use clap::ValueEnum;

pub mod config;
pub mod counters;
pub mod error;
pub mod harness;
pub mod logs;
pub mod plan;
pub mod report;
pub mod schema;
pub mod server;
pub mod sut;
pub mod task;
pub mod tasks;

pub use counters::Counters;
pub use error::{BenchError, BenchResult};
pub use plan::TestPlan;
pub use report::Report;
pub use sut::SystemUnderTest;
pub use task::{PerformanceTask, Step, Task};

/// What happens to the persisted state of the system under test before a version run.
#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq, Hash)]
pub enum PersistenceMode {
    /// Keep the existing database (upgrade-sensitive measurements).
    FullDb,
    /// Wipe the database and start from a clean state.
    EmptyDb,
}

impl PersistenceMode {
    pub fn keeps_state(&self) -> bool {
        matches!(self, PersistenceMode::FullDb)
    }

    /// Suffix appended to the version label in the report header.
    pub fn label_suffix(&self) -> &'static str {
        match self {
            PersistenceMode::FullDb => " (FULL DB)",
            PersistenceMode::EmptyDb => " (EMPTY DB)",
        }
    }

    pub fn label(&self, version: &str) -> String {
        format!("{version}{}", self.label_suffix())
    }
}
