use crate::error::BenchResult;
use crate::PersistenceMode;

/// Lifecycle and interaction capabilities the plan needs from the system under test.
///
/// Implementations own everything about provisioning (installing a version, wiping its
/// database, spawning processes). The plan only sequences calls.
pub trait SystemUnderTest {
    /// Provisions and starts an instance pinned to `version`.
    fn start(&mut self, version: &str, mode: PersistenceMode) -> BenchResult<()>;

    /// Stops the running instance. Stopping an instance that is not running is a no-op.
    fn stop(&mut self) -> BenchResult<()>;

    /// Stops and starts the current instance again, keeping its state.
    fn restart(&mut self) -> BenchResult<()>;

    /// Runs an arbitrary build or action against the instance and returns its textual output.
    fn execute_capturing_output(&mut self, command: &[String]) -> BenchResult<String>;

    /// Lines of one of the instance's log files.
    fn log_lines(&self, file: &str) -> BenchResult<Vec<String>>;

    /// Empties the instance's log files so the next scrape only sees fresh lines.
    fn clear_logs(&mut self) -> BenchResult<()>;
}
