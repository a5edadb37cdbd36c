//! JSON plan files.
//!
//! ```json
//! {
//!   "versions_on_existing_db": ["3.7"],
//!   "versions_on_fresh_db": ["3.5", "3.6.2"],
//!   "server": { "start": ["./start.sh", "{version}"], "stop": ["./stop.sh"], "logs_dir": "logs" },
//!   "tasks": [
//!     { "kind": "setup", "command": ["mvn", "clean", "package"] },
//!     { "kind": "startup", "name": "Start Server" },
//!     { "kind": "build", "name": "Struts Maven Scan", "command": ["mvn", "verify"] },
//!     { "kind": "restart", "name": "Start server - second time" },
//!     { "kind": "stop", "name": "Stop Server" }
//!   ]
//! }
//! ```

use crate::error::{BenchError, BenchResult};
use crate::plan::TestPlan;
use crate::server::{ProcessServer, ServerConfig};
use crate::task::Task;
use crate::tasks;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_work_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_server_log() -> String {
    "server.log".to_string()
}

fn default_build_replay() -> u32 {
    tasks::BUILD_REPLAY
}

fn default_replay() -> u32 {
    1
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskSpec {
    Setup {
        command: Vec<String>,
    },
    Build {
        name: String,
        command: Vec<String>,
        #[serde(default = "default_build_replay")]
        replay: u32,
    },
    Startup {
        name: String,
        #[serde(default = "default_server_log")]
        log: String,
    },
    Restart {
        name: String,
        #[serde(default = "default_server_log")]
        log: String,
    },
    Stop {
        name: String,
        #[serde(default = "default_server_log")]
        log: String,
    },
    Computation {
        name: String,
        command: Vec<String>,
        log: String,
        #[serde(default = "default_replay")]
        replay: u32,
    },
}

impl TaskSpec {
    pub fn build(&self) -> BenchResult<Task> {
        match self {
            TaskSpec::Setup { command } => {
                check_command("setup", command)?;
                Ok(tasks::setup_command(command.clone()))
            }
            TaskSpec::Build {
                name,
                command,
                replay,
            } => {
                check_command(name, command)?;
                tasks::build_scan(name, command.clone(), *replay)
            }
            TaskSpec::Startup { name, log } => tasks::startup_time(name, log),
            TaskSpec::Restart { name, log } => tasks::restart_server(name, log),
            TaskSpec::Stop { name, log } => tasks::stop_server(name, log),
            TaskSpec::Computation {
                name,
                command,
                log,
                replay,
            } => {
                check_command(name, command)?;
                tasks::computation_time(name, command.clone(), log, *replay)
            }
        }
    }
}

fn check_command(task: &str, command: &[String]) -> BenchResult<()> {
    if command.is_empty() {
        return Err(BenchError::Config(format!("task {task} has an empty command")));
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanConfig {
    #[serde(default)]
    pub versions_on_existing_db: Vec<String>,
    #[serde(default)]
    pub versions_on_fresh_db: Vec<String>,
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    pub server: ServerConfig,
    #[serde(default)]
    pub tasks: Vec<TaskSpec>,
}

impl PlanConfig {
    pub fn from_json(json: &str) -> BenchResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> BenchResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn build_server(&self) -> BenchResult<ProcessServer> {
        ProcessServer::new(self.server.clone())
    }

    /// Builds the plan, validating every task before any version runs.
    pub fn build_plan(&self) -> BenchResult<TestPlan> {
        let tasks = self
            .tasks
            .iter()
            .map(TaskSpec::build)
            .collect::<BenchResult<Vec<_>>>()?;
        Ok(TestPlan::new()
            .versions_on_existing_db(self.versions_on_existing_db.iter().cloned())
            .versions_on_fresh_db(self.versions_on_fresh_db.iter().cloned())
            .tasks(tasks)
            .work_dir(self.work_dir.clone()))
    }
}
