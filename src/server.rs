//! [`SystemUnderTest`] backed by external commands.
//!
//! Start, stop and wipe are plain command lines. `{version}` in any argument is replaced by
//! the version being provisioned. Output of every command is captured (stdout followed by
//! stderr) so it can be fed to the log scrapers.

use crate::error::{BenchError, BenchResult};
use crate::logs;
use crate::sut::SystemUnderTest;
use crate::PersistenceMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};

const VERSION_PLACEHOLDER: &str = "{version}";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub start: Vec<String>,
    pub stop: Vec<String>,
    /// Run before `start` when the database must be wiped.
    #[serde(default)]
    pub wipe: Option<Vec<String>>,
    /// Directory holding the server's `*.log` files.
    #[serde(default)]
    pub logs_dir: Option<PathBuf>,
    /// Working directory of every spawned command.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

#[derive(Debug)]
pub struct ProcessServer {
    config: ServerConfig,
    running: Option<String>,
}

impl ProcessServer {
    pub fn new(config: ServerConfig) -> BenchResult<Self> {
        if config.start.is_empty() {
            return Err(BenchError::Config("server start command is empty".into()));
        }
        if config.stop.is_empty() {
            return Err(BenchError::Config("server stop command is empty".into()));
        }
        if matches!(config.wipe.as_deref(), Some([])) {
            return Err(BenchError::Config("server wipe command is empty".into()));
        }
        Ok(Self {
            config,
            running: None,
        })
    }

    /// Version of the running instance, if any.
    pub fn running_version(&self) -> Option<&str> {
        self.running.as_deref()
    }

    fn run(&self, command: &[String], version: Option<&str>) -> BenchResult<String> {
        let args: Vec<String> = command
            .iter()
            .map(|arg| match version {
                Some(v) => arg.replace(VERSION_PLACEHOLDER, v),
                None => arg.clone(),
            })
            .collect();
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| BenchError::Config("empty command".into()))?;

        let mut cmd = Command::new(program);
        cmd.args(rest);
        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }

        debug!(command = %args.join(" "), "spawning");
        let output = cmd.output()?;
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(BenchError::Command {
                command: args.join(" "),
                status: output.status.to_string(),
                output: text,
            });
        }
        Ok(text)
    }
}

impl SystemUnderTest for ProcessServer {
    fn start(&mut self, version: &str, mode: PersistenceMode) -> BenchResult<()> {
        if self.running.is_some() {
            self.stop()?;
        }
        if !mode.keeps_state() {
            if let Some(wipe) = &self.config.wipe {
                info!(version, "wiping database");
                self.run(wipe, Some(version))?;
            }
        }
        self.clear_logs()?;
        info!(version, keep_database = mode.keeps_state(), "starting server");
        self.run(&self.config.start, Some(version))?;
        self.running = Some(version.to_string());
        Ok(())
    }

    /// The instance stays registered until its stop command succeeds, so a failed stop can
    /// be retried by the plan teardown.
    fn stop(&mut self) -> BenchResult<()> {
        let Some(version) = self.running.clone() else {
            return Ok(());
        };
        info!(version = %version, "stopping server");
        self.run(&self.config.stop, Some(&version))?;
        self.running = None;
        Ok(())
    }

    fn restart(&mut self) -> BenchResult<()> {
        let version = self.running.clone().ok_or_else(|| {
            BenchError::Server("cannot restart a server that is not running".into())
        })?;
        self.stop()?;
        self.clear_logs()?;
        self.run(&self.config.start, Some(&version))?;
        self.running = Some(version);
        Ok(())
    }

    fn execute_capturing_output(&mut self, command: &[String]) -> BenchResult<String> {
        let version = self.running.clone();
        self.run(command, version.as_deref())
    }

    fn log_lines(&self, file: &str) -> BenchResult<Vec<String>> {
        let dir = self
            .config
            .logs_dir
            .as_ref()
            .ok_or_else(|| BenchError::Config("server logs_dir is not configured".into()))?;
        Ok(logs::read_lines(&dir.join(file))?)
    }

    fn clear_logs(&mut self) -> BenchResult<()> {
        if let Some(dir) = &self.config.logs_dir {
            let cleared = logs::clear_logs(dir)?;
            debug!(dir = %dir.display(), cleared, "cleared server logs");
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    fn config(dir: &std::path::Path) -> ServerConfig {
        ServerConfig {
            start: sh("echo \"start {version}\" >> calls.txt"),
            stop: sh("echo \"stop {version}\" >> calls.txt"),
            wipe: Some(sh("echo \"wipe {version}\" >> calls.txt")),
            logs_dir: Some(dir.join("logs")),
            working_dir: Some(dir.to_path_buf()),
        }
    }

    #[test]
    fn test_lifecycle_commands() {
        let dir = tempdir().unwrap();
        let mut server = ProcessServer::new(config(dir.path())).unwrap();

        server.start("3.7", PersistenceMode::FullDb).unwrap();
        assert_eq!(server.running_version(), Some("3.7"));
        server.stop().unwrap();
        server.stop().unwrap();
        server.start("3.5", PersistenceMode::EmptyDb).unwrap();
        server.restart().unwrap();
        server.stop().unwrap();

        let calls = fs::read_to_string(dir.path().join("calls.txt")).unwrap();
        assert_eq!(
            calls,
            "start 3.7\nstop 3.7\nwipe 3.5\nstart 3.5\nstop 3.5\nstart 3.5\nstop 3.5\n"
        );
    }

    #[test]
    fn test_captures_output_and_reports_failures() {
        let dir = tempdir().unwrap();
        let mut server = ProcessServer::new(config(dir.path())).unwrap();
        server.start("4.0", PersistenceMode::FullDb).unwrap();

        let out = server
            .execute_capturing_output(&sh("echo 'Total time: 6.015s'; echo 'oops' >&2"))
            .unwrap();
        assert_eq!(out, "Total time: 6.015s\noops\n");

        let versioned = server
            .execute_capturing_output(&sh("echo {version}"))
            .unwrap();
        assert_eq!(versioned, "4.0\n");

        let err = server.execute_capturing_output(&sh("exit 3")).unwrap_err();
        assert!(matches!(err, BenchError::Command { .. }));
    }

    #[test]
    fn test_logs_are_cleared_before_start() {
        let dir = tempdir().unwrap();
        let logs_dir = dir.path().join("logs");
        fs::create_dir_all(&logs_dir).unwrap();
        fs::write(logs_dir.join("server.log"), "2013.07.03 14:22:51 INFO old\n").unwrap();

        let mut server = ProcessServer::new(config(dir.path())).unwrap();
        server.start("1.0", PersistenceMode::FullDb).unwrap();
        assert!(server.log_lines("server.log").unwrap().is_empty());
    }

    #[test]
    fn test_failed_stop_keeps_instance_registered() {
        let dir = tempdir().unwrap();
        let mut server = ProcessServer::new(ServerConfig {
            stop: sh("exit 1"),
            ..config(dir.path())
        })
        .unwrap();
        server.start("1.0", PersistenceMode::FullDb).unwrap();

        assert!(matches!(server.stop(), Err(BenchError::Command { .. })));
        assert_eq!(server.running_version(), Some("1.0"));
        assert!(matches!(server.stop(), Err(BenchError::Command { .. })));
        assert!(matches!(server.restart(), Err(BenchError::Command { .. })));
        assert_eq!(server.running_version(), Some("1.0"));
    }

    #[test]
    fn test_restart_requires_running_server() {
        let dir = tempdir().unwrap();
        let mut server = ProcessServer::new(config(dir.path())).unwrap();
        assert!(matches!(server.restart(), Err(BenchError::Server(_))));
    }

    #[test]
    fn test_empty_commands_are_rejected() {
        let cfg = ServerConfig {
            start: Vec::new(),
            stop: vec!["true".to_string()],
            ..Default::default()
        };
        assert!(matches!(ProcessServer::new(cfg), Err(BenchError::Config(_))));
    }
}
