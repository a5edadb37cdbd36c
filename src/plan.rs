//! Sequential multi-version benchmark driver.
//!
//! Versions on an existing database run first, then versions on a fresh database. Each
//! version run provisions the system under test, executes the shared task sequence and tears
//! the instance down. Runs never overlap: concurrent runs would compete for the same host
//! resources and skew the timings being compared.
//!
//! The first failing task aborts the whole plan after tearing down its instance. Later
//! versions do not run and no report is written.

use crate::counters::Counters;
use crate::error::{BenchError, BenchResult};
use crate::report::Report;
use crate::sut::SystemUnderTest;
use crate::task::Task;
use crate::PersistenceMode;
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct TestPlan {
    versions_on_existing_db: Vec<String>,
    versions_on_fresh_db: Vec<String>,
    tasks: Vec<Task>,
    work_dir: PathBuf,
}

impl Default for TestPlan {
    fn default() -> Self {
        Self {
            versions_on_existing_db: Vec::new(),
            versions_on_fresh_db: Vec::new(),
            tasks: Vec::new(),
            work_dir: PathBuf::from("."),
        }
    }
}

impl TestPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn versions_on_existing_db<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.versions_on_existing_db = versions.into_iter().map(Into::into).collect();
        self
    }

    pub fn versions_on_fresh_db<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.versions_on_fresh_db = versions.into_iter().map(Into::into).collect();
        self
    }

    pub fn tasks(mut self, tasks: Vec<Task>) -> Self {
        self.tasks = tasks;
        self
    }

    /// Directory the report path is resolved against.
    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    /// Runs every version and dumps the report once all of them completed.
    pub fn execute(&mut self, sut: &mut dyn SystemUnderTest) -> BenchResult<Report> {
        if let Some(version) = self
            .versions_on_existing_db
            .iter()
            .chain(&self.versions_on_fresh_db)
            .find(|v| v.contains(|c: char| c == ',' || c == '"'))
        {
            return Err(BenchError::InvalidVersion {
                version: version.clone(),
            });
        }

        let mut report = Report::new();

        let existing = self.versions_on_existing_db.clone();
        let fresh = self.versions_on_fresh_db.clone();
        for version in &existing {
            self.run_version(sut, &mut report, version, PersistenceMode::FullDb)?;
        }
        for version in &fresh {
            self.run_version(sut, &mut report, version, PersistenceMode::EmptyDb)?;
        }

        report.dump(&self.work_dir)?;
        Ok(report)
    }

    fn run_version(
        &mut self,
        sut: &mut dyn SystemUnderTest,
        report: &mut Report,
        version: &str,
        mode: PersistenceMode,
    ) -> BenchResult<()> {
        let label = mode.label(version);
        report.set_current_version(&label);
        info!(version = %label, "starting version run");

        sut.start(version, mode)?;
        let outcome = self.run_tasks(sut, report, &label);
        let teardown = sut.stop();

        match (outcome, teardown) {
            (Err(e), Err(stop_err)) => {
                warn!(version = %label, error = %stop_err, "teardown failed after task error");
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(()), Err(stop_err)) => Err(stop_err),
            (Ok(()), Ok(())) => {
                info!(version = %label, "version run complete");
                Ok(())
            }
        }
    }

    fn run_tasks(
        &mut self,
        sut: &mut dyn SystemUnderTest,
        report: &mut Report,
        label: &str,
    ) -> BenchResult<()> {
        for task in &mut self.tasks {
            let mut counters = Counters::new();
            match task {
                Task::Measured(perf) => {
                    for attempt in 1..=perf.replay() {
                        info!(
                            version = %label,
                            task = perf.name(),
                            attempt,
                            replay = perf.replay(),
                            "running measured task"
                        );
                        perf.execute(sut, &mut counters)?;
                    }
                    for (metric, value) in counters.values() {
                        debug!(task = perf.name(), metric, value, "recording counter");
                    }
                    report.add(perf.name(), &counters);
                }
                Task::Setup(step) => {
                    debug!(version = %label, "running setup task");
                    step.execute(sut, &mut counters)?;
                }
            }
        }
        Ok(())
    }
}
