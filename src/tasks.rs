//! Built-in task kinds: build scans, server startup/restart/stop timings and server-side
//! computation durations.

use crate::counters::Counters;
use crate::error::{BenchError, BenchResult};
use crate::harness::measure_once;
use crate::logs;
use crate::sut::SystemUnderTest;
use crate::task::{Step, Task};

pub const TIME: &str = "Time (ms)";
pub const END_MEMORY: &str = "End Memory (Mb)";
pub const MAX_MEMORY: &str = "Max Memory (Mb)";
pub const WALL_TIME: &str = "Wall Time (ms)";

/// Default number of attempts for a build scan.
pub const BUILD_REPLAY: u32 = 3;

/// Runs a command and records nothing, e.g. to warm build caches.
#[derive(Clone, Debug)]
pub struct SetupCommand {
    pub command: Vec<String>,
}

impl Step for SetupCommand {
    fn execute(&mut self, sut: &mut dyn SystemUnderTest, _: &mut Counters) -> BenchResult<()> {
        sut.execute_capturing_output(&self.command)?;
        Ok(())
    }
}

/// Runs a build and scrapes its summary for duration and memory.
#[derive(Clone, Debug)]
pub struct BuildScan {
    pub command: Vec<String>,
}

impl Step for BuildScan {
    fn execute(
        &mut self,
        sut: &mut dyn SystemUnderTest,
        counters: &mut Counters,
    ) -> BenchResult<()> {
        let measured = measure_once(|| sut.execute_capturing_output(&self.command));
        let wall_ms = measured.elapsed_ms();
        let output = measured.value?;

        counters
            .set(TIME, logs::extract_total_time(&output))
            .set(END_MEMORY, logs::extract_end_memory(&output))
            .set(MAX_MEMORY, logs::extract_max_memory(&output))
            .set(WALL_TIME, Some(wall_ms));
        Ok(())
    }
}

/// Measures the cold start of the version run: the server was started by the plan with
/// fresh logs, so the span of its log is the startup duration.
#[derive(Clone, Debug)]
pub struct StartupTime {
    pub log: String,
}

impl Step for StartupTime {
    fn execute(
        &mut self,
        sut: &mut dyn SystemUnderTest,
        counters: &mut Counters,
    ) -> BenchResult<()> {
        let lines = sut.log_lines(&self.log)?;
        counters.set(TIME, logs::elapsed_millis(&lines));
        Ok(())
    }
}

/// Restarts the server and measures startup from the span of its log.
#[derive(Clone, Debug)]
pub struct RestartServer {
    pub log: String,
}

impl Step for RestartServer {
    fn execute(
        &mut self,
        sut: &mut dyn SystemUnderTest,
        counters: &mut Counters,
    ) -> BenchResult<()> {
        sut.clear_logs()?;
        sut.restart()?;

        let lines = sut.log_lines(&self.log)?;
        let duration =
            logs::elapsed_millis(&lines).ok_or_else(|| BenchError::MetricUnavailable {
                metric: format!("startup duration from {}", self.log),
            })?;
        counters.set(TIME, Some(duration));
        Ok(())
    }
}

/// Stops the server and records the shutdown duration it reports.
#[derive(Clone, Debug)]
pub struct StopServer {
    pub log: String,
}

impl Step for StopServer {
    fn execute(
        &mut self,
        sut: &mut dyn SystemUnderTest,
        counters: &mut Counters,
    ) -> BenchResult<()> {
        sut.clear_logs()?;
        sut.stop()?;

        let lines = sut.log_lines(&self.log)?;
        // Log timestamps are second-grained; the explicit stop message is preferred.
        let duration = logs::extract_stop_time(&lines).or_else(|| logs::elapsed_millis(&lines));
        counters.set(TIME, duration);
        Ok(())
    }
}

/// Triggers a server-side computation and reads how long its last phase took.
#[derive(Clone, Debug)]
pub struct ComputationTime {
    pub command: Vec<String>,
    pub log: String,
}

impl Step for ComputationTime {
    fn execute(
        &mut self,
        sut: &mut dyn SystemUnderTest,
        counters: &mut Counters,
    ) -> BenchResult<()> {
        sut.execute_capturing_output(&self.command)?;
        let lines = sut.log_lines(&self.log)?;
        counters.set(TIME, logs::extract_computation_total_time(&lines));
        Ok(())
    }
}

pub fn setup_command(command: Vec<String>) -> Task {
    Task::setup(SetupCommand { command })
}

pub fn build_scan(name: &str, command: Vec<String>, replay: u32) -> BenchResult<Task> {
    Task::measured(name, replay, BuildScan { command })
}

pub fn startup_time(name: &str, log: &str) -> BenchResult<Task> {
    Task::measured(
        name,
        1,
        StartupTime {
            log: log.to_string(),
        },
    )
}

pub fn restart_server(name: &str, log: &str) -> BenchResult<Task> {
    Task::measured(
        name,
        1,
        RestartServer {
            log: log.to_string(),
        },
    )
}

pub fn stop_server(name: &str, log: &str) -> BenchResult<Task> {
    Task::measured(
        name,
        1,
        StopServer {
            log: log.to_string(),
        },
    )
}

pub fn computation_time(
    name: &str,
    command: Vec<String>,
    log: &str,
    replay: u32,
) -> BenchResult<Task> {
    Task::measured(
        name,
        replay,
        ComputationTime {
            command,
            log: log.to_string(),
        },
    )
}
